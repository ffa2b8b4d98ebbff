//! Typed errors raised by the domain layer. Services wrap them in
//! `anyhow::Error`; the REST layer downcasts to pick a status code.

use chrono::NaiveDate;
use thiserror::Error;

/// Rejections of user-entered child fields
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChildValidationError {
    #[error("Name and school are required")]
    MissingNameOrSchool,

    #[error("Name must be at least {min} characters")]
    NameTooShort { min: usize },

    #[error("School must be at least {min} characters")]
    SchoolTooShort { min: usize },

    #[error("Name cannot exceed {max} characters")]
    NameTooLong { max: usize },

    #[error("School cannot exceed {max} characters")]
    SchoolTooLong { max: usize },

    #[error("Inbound fare cannot be negative")]
    NegativeFareIn,

    #[error("Outbound fare cannot be negative")]
    NegativeFareOut,

    #[error("Fare cannot exceed {max}")]
    FareTooLarge { field: &'static str, max: u64 },

    #[error("At least one service day is required")]
    NoServiceDays,

    #[error("Invalid weekday {0}, expected 0 (Sunday) to 6 (Saturday)")]
    InvalidWeekday(u8),
}

impl ChildValidationError {
    /// Name of the offending request field
    pub fn field(&self) -> &'static str {
        match self {
            ChildValidationError::MissingNameOrSchool
            | ChildValidationError::NameTooShort { .. }
            | ChildValidationError::NameTooLong { .. } => "name",
            ChildValidationError::SchoolTooShort { .. } | ChildValidationError::SchoolTooLong { .. } => "school",
            ChildValidationError::NegativeFareIn => "fareIn",
            ChildValidationError::NegativeFareOut => "fareOut",
            ChildValidationError::FareTooLarge { field, .. } => *field,
            ChildValidationError::NoServiceDays | ChildValidationError::InvalidWeekday(_) => "days",
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Child not found: {0}")]
    ChildNotFound(String),

    #[error("No status recorded for child {child_id} on {date}")]
    StatusNotFound { child_id: String, date: NaiveDate },

    #[error("{date} is a holiday ({name}) and cannot be edited")]
    HolidayLocked { date: NaiveDate, name: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error("Import payload must be a JSON object")]
    NotAnObject,

    #[error("Invalid '{key}' in import payload: {reason}")]
    Malformed { key: &'static str, reason: String },
}
