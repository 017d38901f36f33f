use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::require_admin;
use crate::models::Client;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ClientRequest {
    pub first_name: String,
    pub last_name: Option<String>,
    pub phone: String,
}

// GET /api/clients
pub async fn list_clients(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Client>>, AppError> {
    require_admin(&headers, state.auth.as_ref())?;

    let clients = {
        let db = state.db.lock().unwrap();
        queries::list_clients(&db)?
    };
    Ok(Json(clients))
}

// POST /api/clients
pub async fn create_client(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ClientRequest>,
) -> Result<(StatusCode, Json<Client>), AppError> {
    require_admin(&headers, state.auth.as_ref())?;

    if req.first_name.trim().is_empty() {
        return Err(AppError::Validation("first_name is required".to_string()));
    }

    let client = Client {
        id: uuid::Uuid::new_v4().to_string(),
        first_name: req.first_name.trim().to_string(),
        last_name: req.last_name,
        phone: req.phone,
    };
    {
        let db = state.db.lock().unwrap();
        queries::create_client(&db, &client)?;
    }
    Ok((StatusCode::CREATED, Json(client)))
}

// PUT /api/clients/:id
pub async fn update_client(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(req): Json<ClientRequest>,
) -> Result<Json<Client>, AppError> {
    require_admin(&headers, state.auth.as_ref())?;

    let client = Client {
        id: id.clone(),
        first_name: req.first_name,
        last_name: req.last_name,
        phone: req.phone,
    };
    let updated = {
        let db = state.db.lock().unwrap();
        queries::update_client(&db, &client)?
    };
    if !updated {
        return Err(AppError::NotFound(format!("client {id}")));
    }
    Ok(Json(client))
}

// DELETE /api/clients/:id
pub async fn delete_client(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&headers, state.auth.as_ref())?;

    let deleted = {
        let db = state.db.lock().unwrap();
        queries::delete_client(&db, &id)?
    };
    if !deleted {
        return Err(AppError::NotFound(format!("client {id}")));
    }
    Ok(Json(serde_json::json!({ "msg": "deleted" })))
}
