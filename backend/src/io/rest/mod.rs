//! # REST API Interface Layer
//!
//! HTTP endpoints for RutaKids, all mounted under `/api`. Handlers only
//! translate: they parse paths and queries, call one service, and map domain
//! errors to status codes.
//!
//! | Error | Status |
//! |---|---|
//! | `ChildValidationError`, `ImportError`, `DateError`, `HolidayLocked` | 400 |
//! | `ChildNotFound`, `StatusNotFound` | 404 |
//! | anything else | 500 |

pub mod calendar_apis;
pub mod child_apis;
pub mod data_apis;
pub mod report_apis;
pub mod status_apis;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::NaiveDate;
use serde_json::json;
use tracing::{error, warn};

use crate::domain::dates::{parse_date, DateError};
use crate::domain::errors::{ChildValidationError, ImportError, StoreError};

/// Status code for an error returned by a service
pub fn status_for(e: &anyhow::Error) -> StatusCode {
    if e.downcast_ref::<ChildValidationError>().is_some()
        || e.downcast_ref::<ImportError>().is_some()
        || e.downcast_ref::<DateError>().is_some()
    {
        return StatusCode::BAD_REQUEST;
    }

    match e.downcast_ref::<StoreError>() {
        Some(StoreError::ChildNotFound(_)) | Some(StoreError::StatusNotFound { .. }) => StatusCode::NOT_FOUND,
        Some(StoreError::HolidayLocked { .. }) => StatusCode::BAD_REQUEST,
        None => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// JSON error body `{"error": ..., "field": ...}`
pub fn error_response(context: &str, e: anyhow::Error) -> Response {
    let status = status_for(&e);
    if status.is_server_error() {
        error!("{}: {:#}", context, e);
    } else {
        warn!("{}: {}", context, e);
    }

    let field = e.downcast_ref::<ChildValidationError>().map(ChildValidationError::field);
    let message = if status.is_server_error() {
        context.to_string()
    } else {
        e.to_string()
    };
    (status, Json(json!({ "error": message, "field": field }))).into_response()
}

/// Parse a `YYYY-MM-DD` path segment
pub(crate) fn path_date(value: &str) -> Result<NaiveDate, Response> {
    parse_date(value).map_err(|e| error_response("Invalid date", e.into()))
}

/// The server's local date
pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let validation: anyhow::Error = ChildValidationError::NoServiceDays.into();
        assert_eq!(status_for(&validation), StatusCode::BAD_REQUEST);

        let missing: anyhow::Error = StoreError::ChildNotFound("c9".to_string()).into();
        assert_eq!(status_for(&missing), StatusCode::NOT_FOUND);

        let date: anyhow::Error = DateError::InvalidMonth(13).into();
        assert_eq!(status_for(&date), StatusCode::BAD_REQUEST);

        let other = anyhow::anyhow!("disk on fire");
        assert_eq!(status_for(&other), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_path_date() {
        assert!(path_date("2026-03-02").is_ok());
        let rejected = path_date("2026-3-2").unwrap_err();
        assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);
    }
}
