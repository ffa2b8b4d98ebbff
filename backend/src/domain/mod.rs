//! # Domain Module
//!
//! Business rules for RutaKids: how a child's day is charged, how days are
//! aggregated into statistics, and the services the REST layer calls.
//!
//! ## Layout
//!
//! - **dates**, **status**, **fare**, **aggregation**: pure functions over
//!   children and status records
//! - **store**: the in-memory state and its persisted handle
//! - **\*_service**: one service per area of the app, each holding a
//!   `StoreHandle` clone
//!
//! Services return `anyhow::Result` and wrap the typed errors in `errors`.

pub mod aggregation;
pub mod calendar;
pub mod child_service;
pub mod data_service;
pub mod dates;
pub mod demo;
pub mod errors;
pub mod fare;
pub mod notification_service;
pub mod report_service;
pub mod status;
pub mod status_service;
pub mod store;
pub mod sync_service;

pub use calendar::CalendarService;
pub use child_service::ChildService;
pub use data_service::DataService;
pub use errors::{ChildValidationError, ImportError, StoreError};
pub use notification_service::NotificationService;
pub use report_service::ReportService;
pub use status_service::StatusService;
pub use store::{AppStore, StoreHandle, StoreOptions};
pub use sync_service::{BootstrapOutcome, SyncService};
