use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::require_admin;
use crate::models::StaffMember;
use crate::state::AppState;

// GET /api/staff — public, the widget shows the roster.
pub async fn list_staff(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<StaffMember>>, AppError> {
    let staff = {
        let db = state.db.lock().unwrap();
        queries::list_staff(&db)?
    };
    Ok(Json(staff))
}

// POST /api/staff
#[derive(Deserialize)]
pub struct CreateStaffRequest {
    pub name: String,
    pub color: Option<String>,
    pub specialty: Option<String>,
}

pub async fn create_staff(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateStaffRequest>,
) -> Result<(StatusCode, Json<StaffMember>), AppError> {
    require_admin(&headers, state.auth.as_ref())?;

    if req.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }

    let member = StaffMember {
        id: uuid::Uuid::new_v4().to_string(),
        name: req.name.trim().to_string(),
        color: req.color.unwrap_or_else(|| "#EC4899".to_string()),
        specialty: req.specialty,
    };
    {
        let db = state.db.lock().unwrap();
        queries::create_staff(&db, &member)?;
    }
    Ok((StatusCode::CREATED, Json(member)))
}

// DELETE /api/staff/:id — bookings keep their staff reference (tolerated as
// unassigned downstream), no cascade.
pub async fn delete_staff(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&headers, state.auth.as_ref())?;

    let deleted = {
        let db = state.db.lock().unwrap();
        queries::delete_staff(&db, &id)?
    };
    if !deleted {
        return Err(AppError::NotFound(format!("staff {id}")));
    }
    Ok(Json(serde_json::json!({ "msg": "deleted" })))
}
