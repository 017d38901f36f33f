pub mod auth;
pub mod bookings;
pub mod clients;
pub mod health;
pub mod planning;
pub mod staff;

use axum::http::HeaderMap;

use crate::errors::AppError;
use crate::services::auth::AuthProvider;

/// Bearer-token gate for the admin dashboard routes. Widget-facing routes
/// (availability, booking creation) stay public.
pub(crate) fn require_admin(headers: &HeaderMap, auth: &dyn AuthProvider) -> Result<(), AppError> {
    let header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let token = header.strip_prefix("Bearer ").unwrap_or("");
    auth.current_session(token)
        .map(|_| ())
        .ok_or(AppError::Unauthorized)
}
