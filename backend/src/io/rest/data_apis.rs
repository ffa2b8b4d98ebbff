//! # REST API for Data Management
//!
//! Backup export/import, the full reset, and the app configuration and user
//! profile.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde_json::Value;
use shared::{ResetRequest, UpdateConfigRequest, UpdateUserRequest};
use tracing::info;

use super::error_response;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/data/export", get(export_data))
        .route("/data/import", post(import_data))
        .route("/data/reset", post(reset_data))
        .route("/config", get(get_config).put(update_config))
        .route("/user", get(get_user).put(update_user))
}

/// Whole-state snapshot, as written to backup files
pub async fn export_data(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/data/export");
    (StatusCode::OK, Json(state.data_service.export(Utc::now()))).into_response()
}

/// Replace the keys present in the payload
pub async fn import_data(State(state): State<AppState>, Json(payload): Json<Value>) -> impl IntoResponse {
    info!("POST /api/data/import");

    match state.data_service.import(&payload) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to import data", e),
    }
}

pub async fn reset_data(State(state): State<AppState>, Json(request): Json<ResetRequest>) -> impl IntoResponse {
    info!("POST /api/data/reset - request: {:?}", request);

    match state.data_service.reset(request.display_name.as_deref(), Utc::now()).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to reset data", e),
    }
}

pub async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/config");
    (StatusCode::OK, Json(state.data_service.get_config())).into_response()
}

pub async fn update_config(
    State(state): State<AppState>,
    Json(request): Json<UpdateConfigRequest>,
) -> impl IntoResponse {
    info!("PUT /api/config - request: {:?}", request);

    match state.data_service.update_config(request) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to update configuration", e),
    }
}

pub async fn get_user(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/user");
    (StatusCode::OK, Json(state.data_service.get_user())).into_response()
}

pub async fn update_user(State(state): State<AppState>, Json(request): Json<UpdateUserRequest>) -> impl IntoResponse {
    info!("PUT /api/user - request: {:?}", request);

    match state.data_service.update_user(request) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to update user", e),
    }
}
