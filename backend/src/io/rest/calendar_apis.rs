use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::Datelike;
use serde::Deserialize;
use shared::{CalendarView, FuturePolicy, HolidayResponse};
use tracing::info;

use super::{error_response, path_date, today};
use crate::domain::dates::holiday_name;
use crate::AppState;

// Query parameters for month based APIs; both default to the current month
#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

impl MonthQuery {
    pub fn resolve(&self) -> (i32, u32) {
        let today = today();
        (self.year.unwrap_or(today.year()), self.month.unwrap_or(today.month()))
    }
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub future: FuturePolicy,
}

#[derive(Debug, Deserialize)]
pub struct CalendarStatsQuery {
    #[serde(default)]
    pub view: CalendarView,
    pub date: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/calendar/month", get(get_calendar_month))
        .route("/calendar/stats", get(get_calendar_stats))
        .route("/stats/range", get(get_range_stats))
        .route("/stats/month", get(get_month_stats))
        .route("/holidays/:date", get(get_holiday))
}

/// Month grid with holiday and trip markers
async fn get_calendar_month(State(state): State<AppState>, Query(query): Query<MonthQuery>) -> impl IntoResponse {
    info!("GET /api/calendar/month - query: {:?}", query);
    let (year, month) = query.resolve();

    match state.calendar_service.month_grid(year, month) {
        Ok(grid) => (StatusCode::OK, Json(grid)).into_response(),
        Err(e) => error_response("Error building calendar month", e),
    }
}

/// Statistics for the month, week or year around a date, future days included
async fn get_calendar_stats(
    State(state): State<AppState>,
    Query(query): Query<CalendarStatsQuery>,
) -> impl IntoResponse {
    info!("GET /api/calendar/stats - query: {:?}", query);
    let today = today();
    let date = match query.date.as_deref().map(path_date).transpose() {
        Ok(date) => date.unwrap_or(today),
        Err(response) => return response,
    };

    match state.calendar_service.view_stats(query.view, date, today) {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => error_response("Error computing calendar stats", e),
    }
}

async fn get_range_stats(State(state): State<AppState>, Query(query): Query<RangeQuery>) -> impl IntoResponse {
    info!("GET /api/stats/range - query: {:?}", query);
    let (start, end) = match (path_date(&query.start), path_date(&query.end)) {
        (Ok(start), Ok(end)) => (start, end),
        (Err(response), _) | (_, Err(response)) => return response,
    };

    let response = state.calendar_service.range_stats(start, end, query.future, today());
    (StatusCode::OK, Json(response)).into_response()
}

/// Historical month statistics; days after today are left out
async fn get_month_stats(State(state): State<AppState>, Query(query): Query<MonthQuery>) -> impl IntoResponse {
    info!("GET /api/stats/month - query: {:?}", query);
    let (year, month) = query.resolve();

    match state.calendar_service.month_stats(year, month, today()) {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => error_response("Error computing month stats", e),
    }
}

async fn get_holiday(Path(date): Path<String>) -> impl IntoResponse {
    match path_date(&date) {
        Ok(date) => {
            let response = HolidayResponse {
                date,
                holiday: holiday_name(date).map(str::to_string),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(response) => response,
    }
}
