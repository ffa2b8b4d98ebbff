//! Whole-state operations: export, import and reset, plus the app
//! configuration and user profile.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::Value;
use shared::{
    AppConfig, AppSnapshot, ConfigResponse, ImportResponse, UpdateConfigRequest, UpdateUserRequest, UserProfile,
    UserResponse, DEFAULT_USER_NAME,
};
use tracing::{error, info, warn};

use super::errors::{ImportError, StoreError};
use super::store::{StoreHandle, IMPORT_KEYS};
use super::sync_service::SyncService;
use crate::storage::StorageKey;

#[derive(Clone)]
pub struct DataService {
    store: StoreHandle,
    sync: Option<SyncService>,
}

impl DataService {
    pub fn new(store: StoreHandle, sync: Option<SyncService>) -> Self {
        Self { store, sync }
    }

    pub fn export(&self, now: DateTime<Utc>) -> AppSnapshot {
        let snapshot = self.store.snapshot(now);
        info!(
            "Exported {} children and {} status records",
            snapshot.children.len(),
            snapshot.statuses.len()
        );
        snapshot
    }

    /// Replace the keys present in `payload`; nothing changes on error
    pub fn import(&self, payload: &Value) -> Result<ImportResponse> {
        let (summary, saved) = self
            .store
            .mutate::<_, ImportError>(&IMPORT_KEYS, |store| store.import(payload))?;

        info!(
            "Imported {} children and {} status records",
            summary.children, summary.statuses
        );
        if !saved {
            error!("Imported data could not be saved to disk");
        }

        Ok(ImportResponse {
            children: summary.children,
            statuses: summary.statuses,
            saved,
            success_message: format!(
                "Datos importados: {} niños, {} registros",
                summary.children, summary.statuses
            ),
        })
    }

    /// Empty payload for a fresh start under `display_name`
    pub fn empty_snapshot(display_name: &str, now: DateTime<Utc>) -> AppSnapshot {
        AppSnapshot {
            children: Vec::new(),
            statuses: Default::default(),
            config: AppConfig {
                user_name: display_name.to_string(),
                ..AppConfig::default()
            },
            user: UserProfile::from_name(display_name),
            export_date: Some(now),
        }
    }

    /// Wipe every key and start over with the empty payload.
    ///
    /// Without a display name the synced account's profile name is used. With
    /// sync configured the empty payload is pushed first, and no autosave can
    /// push until local data is wiped; if the push fails local data is left as
    /// it was.
    pub async fn reset(&self, display_name: Option<&str>, now: DateTime<Utc>) -> Result<ImportResponse> {
        let name = normalized(display_name)
            .or_else(|| self.sync.as_ref().map(|sync| sync.profile_name().to_string()))
            .unwrap_or_else(|| DEFAULT_USER_NAME.to_string());
        let empty = Self::empty_snapshot(&name, now);

        let saved = match &self.sync {
            Some(sync) => {
                info!("Pushing empty payload for account {}", sync.account_id());
                sync.replace_remote(&empty, || self.wipe(empty.clone())).await?
            }
            None => self.wipe(empty)?,
        };

        info!("Reset all data for {}", name);
        if !saved {
            error!("Reset state could not be saved to disk");
        }

        Ok(ImportResponse {
            children: 0,
            statuses: 0,
            saved,
            success_message: "Datos restablecidos".to_string(),
        })
    }

    fn wipe(&self, empty: AppSnapshot) -> Result<bool> {
        self.store.clear_all()?;
        let (_, saved) = self.store.mutate_quiet::<_, StoreError>(&StorageKey::ALL, |store| {
            store.apply_snapshot(empty);
            store.demo_disabled = true;
            Ok(())
        })?;
        Ok(saved)
    }

    pub fn get_config(&self) -> AppConfig {
        self.store.read(|store| store.config.clone())
    }

    /// Shallow merge; a blank user name keeps the current one
    pub fn update_config(&self, request: UpdateConfigRequest) -> Result<ConfigResponse> {
        let (config, saved) = self.store.mutate::<_, StoreError>(&[StorageKey::Config], |store| {
            if let Some(name) = normalized(request.user_name.as_deref()) {
                store.config.user_name = name;
            }
            if let Some(enabled) = request.notifications_enabled {
                store.config.notifications_enabled = enabled;
            }
            if let Some(days) = request.payment_reminder_days {
                store.config.payment_reminder_days = days;
            }
            Ok(store.config.clone())
        })?;

        info!("Updated configuration: {:?}", config);
        if !saved {
            warn!("Configuration kept in memory only");
        }
        Ok(ConfigResponse { config, saved })
    }

    pub fn get_user(&self) -> UserProfile {
        self.store.read(|store| store.user.clone())
    }

    /// Update the profile; a new name without explicit initials recomputes them
    pub fn update_user(&self, request: UpdateUserRequest) -> Result<UserResponse> {
        let (user, saved) = self.store.mutate::<_, StoreError>(&[StorageKey::User], |store| {
            let name = normalized(request.name.as_deref());
            let initials = normalized(request.initials.as_deref());

            match (name, initials) {
                (Some(name), Some(initials)) => {
                    store.user = UserProfile { name, initials };
                }
                (Some(name), None) => {
                    if name != store.user.name {
                        store.user = UserProfile::from_name(&name);
                    }
                }
                (None, Some(initials)) => store.user.initials = initials,
                (None, None) => {}
            }
            Ok(store.user.clone())
        })?;

        info!("Updated user profile: {}", user.name);
        if !saved {
            warn!("User profile kept in memory only");
        }
        Ok(UserResponse { user, saved })
    }
}

fn normalized(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}
