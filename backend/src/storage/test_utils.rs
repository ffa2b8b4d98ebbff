//! Test utilities providing a throwaway data directory per test.
//!
//! The temporary directory is removed when the `TestEnvironment` is dropped,
//! even if the test panics.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use shared::AppSnapshot;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use super::json::{JsonConnection, JsonKeyValueRepository};
use super::traits::{KeyValueStorage, RemoteStore, StorageKey};
use crate::domain::store::{StoreHandle, StoreOptions};

pub struct TestEnvironment {
    /// Kept alive until drop
    _temp_dir: TempDir,
    pub connection: JsonConnection,
    pub base_path: PathBuf,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let base_path = temp_dir.path().to_path_buf();
        let connection = JsonConnection::new(&base_path)?;

        Ok(TestEnvironment {
            _temp_dir: temp_dir,
            connection,
            base_path,
        })
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_path
    }

    pub fn key_value_repository(&self) -> JsonKeyValueRepository {
        JsonKeyValueRepository::new(self.connection.clone())
    }

    pub fn storage(&self) -> Arc<dyn KeyValueStorage> {
        Arc::new(self.key_value_repository())
    }

    /// A store with no children and no demo data
    pub fn empty_store(&self) -> StoreHandle {
        let today = NaiveDate::from_ymd_opt(2026, 3, 1).expect("valid date");
        StoreHandle::load(self.storage(), StoreOptions { seed_demo: false }, today)
            .expect("empty store loads")
    }
}

/// Storage whose writes always fail, for exercising unsaved-change paths
pub struct FailingStorage;

impl KeyValueStorage for FailingStorage {
    fn read(&self, _key: StorageKey) -> Result<Option<Value>> {
        Ok(None)
    }

    fn write(&self, key: StorageKey, _value: &Value) -> Result<()> {
        Err(anyhow!("disk full while writing {}", key))
    }

    fn remove(&self, _key: StorageKey) -> Result<()> {
        Ok(())
    }
}

/// In-memory remote that keeps the latest snapshot and records every push
#[derive(Default)]
pub struct RecordingRemote {
    pub stored: Mutex<Option<AppSnapshot>>,
    pub pushes: Mutex<Vec<AppSnapshot>>,
    pub fetches: AtomicUsize,
    /// Number of upcoming fetches that fail
    pub failing_fetches: AtomicUsize,
    /// Applied before every push lands
    pub push_delay: Option<Duration>,
}

impl RecordingRemote {
    pub fn holding(snapshot: AppSnapshot) -> Self {
        Self {
            stored: Mutex::new(Some(snapshot)),
            ..Default::default()
        }
    }

    pub fn push_count(&self) -> usize {
        self.pushes.lock().unwrap().len()
    }

    pub fn stored(&self) -> Option<AppSnapshot> {
        self.stored.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteStore for RecordingRemote {
    async fn fetch(&self, account_id: &str) -> Result<Option<AppSnapshot>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failing_fetches
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(anyhow!("remote unreachable for {}", account_id));
        }
        Ok(self.stored())
    }

    async fn push(&self, _account_id: &str, snapshot: &AppSnapshot) -> Result<()> {
        if let Some(delay) = self.push_delay {
            tokio::time::sleep(delay).await;
        }
        *self.stored.lock().unwrap() = Some(snapshot.clone());
        self.pushes.lock().unwrap().push(snapshot.clone());
        Ok(())
    }
}
