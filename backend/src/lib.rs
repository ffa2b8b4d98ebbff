//! # RutaKids Backend
//!
//! Tracks school-route fares, attendance and payments for a school-transport
//! driver, and serves them over a JSON REST API.
//!
//! ## Architecture
//!
//! ```text
//! IO Layer (REST API, handlers)
//!     ↓
//! Domain Layer (fare rules, aggregation, services)
//!     ↓
//! Storage Layer (JSON documents, remote snapshot mirror)
//! ```
//!
//! `initialize_backend` wires storage, the shared store and every service;
//! `create_router` mounts the handlers under `/api`.

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::domain::{
    CalendarService, ChildService, DataService, NotificationService, ReportService, StatusService, StoreHandle,
    StoreOptions, SyncService,
};
use crate::io::rest::{calendar_apis, child_apis, data_apis, report_apis, status_apis};
use crate::storage::{DirectoryRemoteStore, JsonConnection, JsonKeyValueRepository, KeyValueStorage};

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub child_service: ChildService,
    pub status_service: StatusService,
    pub calendar_service: CalendarService,
    pub report_service: ReportService,
    pub notification_service: NotificationService,
    pub data_service: DataService,
}

/// Everything `main` needs after start-up
pub struct Backend {
    pub state: AppState,
    pub store: StoreHandle,
    /// Present when a remote mirror is configured
    pub sync: Option<SyncService>,
}

/// Initialize the backend with all required services
pub fn initialize_backend(config: &ServerConfig) -> Result<Backend> {
    info!("Setting up storage in {}", config.data_dir.display());
    let connection = JsonConnection::new(&config.data_dir)
        .with_context(|| format!("Cannot use data directory {}", config.data_dir.display()))?;
    let storage: Arc<dyn KeyValueStorage> = Arc::new(JsonKeyValueRepository::new(connection));

    // With a remote mirror the remote state wins, so demo data would only be discarded
    let options = StoreOptions {
        seed_demo: config.seed_demo && config.sync.is_none(),
    };
    let today = chrono::Local::now().date_naive();
    let store = StoreHandle::load(storage, options, today)?;

    let sync = match &config.sync {
        Some(sync_config) => {
            info!(
                "Setting up sync for account {} in {}",
                sync_config.account_id,
                sync_config.remote_dir.display()
            );
            let remote = DirectoryRemoteStore::new(&sync_config.remote_dir)
                .with_context(|| format!("Cannot use sync directory {}", sync_config.remote_dir.display()))?;
            Some(
                SyncService::new(
                    store.clone(),
                    Arc::new(remote),
                    sync_config.account_id.clone(),
                    sync_config.debounce(),
                )
                .with_display_name(sync_config.display_name.clone()),
            )
        }
        None => None,
    };

    info!("Setting up domain model");
    let state = AppState {
        child_service: ChildService::new(store.clone()),
        status_service: StatusService::new(store.clone()),
        calendar_service: CalendarService::new(store.clone()),
        report_service: ReportService::new(store.clone()),
        notification_service: NotificationService::new(store.clone()),
        data_service: DataService::new(store.clone(), sync.clone()),
    };

    Ok(Backend { state, store, sync })
}

/// Create the Axum router with all routes configured
pub fn create_router(state: AppState, config: &ServerConfig) -> Result<Router> {
    let origin = config
        .cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin '{}'", config.cors_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let api_routes = Router::new()
        .merge(child_apis::router())
        .merge(status_apis::router())
        .merge(calendar_apis::router())
        .merge(report_apis::router())
        .merge(data_apis::router());

    let mut router = Router::new().nest("/api", api_routes);
    if let Some(static_dir) = &config.static_dir {
        info!("Serving frontend from {}", static_dir.display());
        router = router.fallback_service(ServeDir::new(static_dir));
    }

    Ok(router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}
