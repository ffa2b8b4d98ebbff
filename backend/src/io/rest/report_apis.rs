//! # REST API for Dashboard, Payments and Reports

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::Datelike;
use serde::Deserialize;
use tracing::info;

use super::calendar_apis::MonthQuery;
use super::{error_response, path_date, today};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct YearQuery {
    pub year: Option<i32>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(get_dashboard))
        .route("/payments", get(get_payments))
        .route("/reports/year", get(get_year_report))
        .route("/reports/month.csv", get(get_month_csv))
        .route("/reports/activity/day/:date", get(get_day_activity))
        .route("/reports/activity/month", get(get_month_activity))
        .route("/reports/activity/year", get(get_year_activity))
        .route("/notifications", get(get_notifications))
}

async fn get_dashboard(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/dashboard");

    match state.report_service.dashboard(today()) {
        Ok(metrics) => (StatusCode::OK, Json(metrics)).into_response(),
        Err(e) => error_response("Error computing dashboard", e),
    }
}

/// Per-child payment days for a month
async fn get_payments(State(state): State<AppState>, Query(query): Query<MonthQuery>) -> impl IntoResponse {
    info!("GET /api/payments - query: {:?}", query);
    let (year, month) = query.resolve();

    match state.report_service.payments_month(year, month) {
        Ok(payments) => (StatusCode::OK, Json(payments)).into_response(),
        Err(e) => error_response("Error listing payments", e),
    }
}

async fn get_year_report(State(state): State<AppState>, Query(query): Query<YearQuery>) -> impl IntoResponse {
    info!("GET /api/reports/year - query: {:?}", query);
    let today = today();
    let year = query.year.unwrap_or(today.year());

    match state.report_service.year_report(year, today) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => error_response("Error building year report", e),
    }
}

/// Month report as a CSV download
async fn get_month_csv(State(state): State<AppState>, Query(query): Query<MonthQuery>) -> impl IntoResponse {
    info!("GET /api/reports/month.csv - query: {:?}", query);
    let (year, month) = query.resolve();

    match state.report_service.month_csv(year, month, today()) {
        Ok(body) => {
            let headers = [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"rutakids_{}_{:02}.csv\"", year, month),
                ),
            ];
            (StatusCode::OK, headers, body).into_response()
        }
        Err(e) => error_response("Error exporting month report", e),
    }
}

/// Children served on a date with their charge, attendance and payment
async fn get_day_activity(State(state): State<AppState>, Path(date): Path<String>) -> impl IntoResponse {
    info!("GET /api/reports/activity/day/{}", date);
    let date = match path_date(&date) {
        Ok(date) => date,
        Err(response) => return response,
    };

    (StatusCode::OK, Json(state.report_service.day_report(date))).into_response()
}

async fn get_month_activity(State(state): State<AppState>, Query(query): Query<MonthQuery>) -> impl IntoResponse {
    info!("GET /api/reports/activity/month - query: {:?}", query);
    let (year, month) = query.resolve();

    match state.report_service.month_activity(year, month) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => error_response("Error building month activity report", e),
    }
}

async fn get_year_activity(State(state): State<AppState>, Query(query): Query<YearQuery>) -> impl IntoResponse {
    info!("GET /api/reports/activity/year - query: {:?}", query);
    let year = query.year.unwrap_or(today().year());

    match state.report_service.year_activity(year) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => error_response("Error building year activity report", e),
    }
}

async fn get_notifications(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/notifications");

    match state.notification_service.notifications(today()) {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => error_response("Error building notifications", e),
    }
}
