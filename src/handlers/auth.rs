use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::services::auth::Role;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub role: Role,
    pub token: String,
}

// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let role = state
        .auth
        .authenticate(&req.email, &req.password)
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(LoginResponse {
        role,
        token: state.config.api_token.clone(),
    }))
}
