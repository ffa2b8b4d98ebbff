//! # REST API for Daily Statuses
//!
//! Per child-day records (`/statuses`) and whole-day operations (`/days`):
//! the day detail modal, the bulk trip editor and clearing a day.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, put},
    Router,
};
use serde_json::json;
use shared::{DayTripsRequest, PaymentToggleRequest, StatusPatch};
use tracing::info;

use super::{error_response, path_date};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/statuses/:child_id/:date",
            get(get_status).put(set_status).delete(clear_status),
        )
        .route("/statuses/:child_id/:date/breakdown", get(get_breakdown))
        .route("/statuses/:child_id/:date/payment", put(set_payment))
        .route("/days/:date", get(day_detail).delete(clear_day))
        .route("/days/:date/trips", put(save_day_trips))
}

pub async fn get_status(
    State(state): State<AppState>,
    Path((child_id, date)): Path<(String, String)>,
) -> impl IntoResponse {
    info!("GET /api/statuses/{}/{}", child_id, date);
    let date = match path_date(&date) {
        Ok(date) => date,
        Err(response) => return response,
    };

    match state.status_service.get_status(&child_id, date) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Error retrieving status", e),
    }
}

/// Charge for one child-day; unknown children get the zero breakdown
pub async fn get_breakdown(
    State(state): State<AppState>,
    Path((child_id, date)): Path<(String, String)>,
) -> impl IntoResponse {
    info!("GET /api/statuses/{}/{}/breakdown", child_id, date);
    let date = match path_date(&date) {
        Ok(date) => date,
        Err(response) => return response,
    };

    (StatusCode::OK, Json(state.status_service.day_breakdown(&child_id, date))).into_response()
}

/// Merge a patch into the child-day record
pub async fn set_status(
    State(state): State<AppState>,
    Path((child_id, date)): Path<(String, String)>,
    Json(patch): Json<StatusPatch>,
) -> impl IntoResponse {
    info!("PUT /api/statuses/{}/{} - patch: {:?}", child_id, date, patch);
    let date = match path_date(&date) {
        Ok(date) => date,
        Err(response) => return response,
    };

    match state.status_service.set_status(&child_id, date, patch) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to set status", e),
    }
}

pub async fn clear_status(
    State(state): State<AppState>,
    Path((child_id, date)): Path<(String, String)>,
) -> impl IntoResponse {
    info!("DELETE /api/statuses/{}/{}", child_id, date);
    let date = match path_date(&date) {
        Ok(date) => date,
        Err(response) => return response,
    };

    match state.status_service.clear_status(&child_id, date) {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => (StatusCode::OK, Json(json!({ "saved": false }))).into_response(),
        Err(e) => error_response("Failed to clear status", e),
    }
}

/// Quick paid/pending toggle from the payments view
pub async fn set_payment(
    State(state): State<AppState>,
    Path((child_id, date)): Path<(String, String)>,
    Json(request): Json<PaymentToggleRequest>,
) -> impl IntoResponse {
    info!("PUT /api/statuses/{}/{}/payment - paid: {}", child_id, date, request.paid);
    let date = match path_date(&date) {
        Ok(date) => date,
        Err(response) => return response,
    };

    match state.status_service.set_payment(&child_id, date, request.paid) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to update payment", e),
    }
}

pub async fn day_detail(State(state): State<AppState>, Path(date): Path<String>) -> impl IntoResponse {
    info!("GET /api/days/{}", date);
    match path_date(&date) {
        Ok(date) => (StatusCode::OK, Json(state.status_service.day_detail(date))).into_response(),
        Err(response) => response,
    }
}

pub async fn clear_day(State(state): State<AppState>, Path(date): Path<String>) -> impl IntoResponse {
    info!("DELETE /api/days/{}", date);
    let date = match path_date(&date) {
        Ok(date) => date,
        Err(response) => return response,
    };

    match state.status_service.clear_date_statuses(date) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to clear day", e),
    }
}

/// Bulk trip editor; rejected on holidays
pub async fn save_day_trips(
    State(state): State<AppState>,
    Path(date): Path<String>,
    Json(request): Json<DayTripsRequest>,
) -> impl IntoResponse {
    info!("PUT /api/days/{}/trips - {} entries", date, request.entries.len());
    let date = match path_date(&date) {
        Ok(date) => date,
        Err(response) => return response,
    };

    match state.status_service.save_day_trips(date, request.entries) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Failed to save day trips", e),
    }
}
