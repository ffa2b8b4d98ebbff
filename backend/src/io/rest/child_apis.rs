//! # REST API for Child Management
//!
//! Endpoints for creating, retrieving, updating and deleting children, plus
//! the per-child status listing.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::json;
use shared::{CreateChildRequest, UpdateChildRequest};
use tracing::info;

use super::error_response;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/children", get(list_children).post(create_child))
        .route("/children/names", get(unique_names))
        .route("/children/:id", get(get_child).put(update_child).delete(delete_child))
        .route("/children/:id/statuses", get(child_statuses))
}

/// Create a new child
pub async fn create_child(
    State(state): State<AppState>,
    Json(request): Json<CreateChildRequest>,
) -> impl IntoResponse {
    info!("POST /api/children - request: {:?}", request);

    match state.child_service.create_child(request) {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(e) => error_response("Failed to create child", e),
    }
}

/// Get a child by ID
pub async fn get_child(State(state): State<AppState>, Path(child_id): Path<String>) -> impl IntoResponse {
    info!("GET /api/children/{}", child_id);

    match state.child_service.get_child(&child_id) {
        Ok(Some(child)) => (StatusCode::OK, Json(child)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, Json(json!({ "error": "Child not found" }))).into_response(),
        Err(e) => error_response("Error retrieving child", e),
    }
}

/// List all children
pub async fn list_children(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/children");

    match state.child_service.list_children() {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Error listing children", e),
    }
}

/// Distinct names, for the dashboard filter
pub async fn unique_names(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/children/names");
    (StatusCode::OK, Json(state.child_service.unique_names())).into_response()
}

pub async fn child_statuses(State(state): State<AppState>, Path(child_id): Path<String>) -> impl IntoResponse {
    info!("GET /api/children/{}/statuses", child_id);

    match state.child_service.child_statuses(&child_id) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Error listing statuses", e),
    }
}

/// Update a child
pub async fn update_child(
    State(state): State<AppState>,
    Path(child_id): Path<String>,
    Json(request): Json<UpdateChildRequest>,
) -> impl IntoResponse {
    info!("PUT /api/children/{} - request: {:?}", child_id, request);

    match state.child_service.update_child(&child_id, request) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to update child", e),
    }
}

/// Delete a child together with its status records
pub async fn delete_child(State(state): State<AppState>, Path(child_id): Path<String>) -> impl IntoResponse {
    info!("DELETE /api/children/{}", child_id);

    match state.child_service.delete_child(&child_id) {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => (StatusCode::OK, Json(json!({ "saved": false }))).into_response(),
        Err(e) => error_response("Failed to delete child", e),
    }
}
