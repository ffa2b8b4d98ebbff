//! # Persistence Store
//!
//! `AppStore` owns the canonical children list, the status book, the app
//! configuration and the user profile. `StoreHandle` shares it between the
//! REST handlers and the sync task, persists the keys touched by each
//! mutation, and publishes a revision number on every user-visible change.
//!
//! ## Lifecycle
//!
//! - `StoreHandle::load` reads every key and seeds demo data on an empty store
//! - `mutate` applies a change in memory, then writes the touched keys
//! - `mutate_quiet` does the same without bumping the revision, for hydration
//!   and resets that must not be echoed back to the remote store
//! - `save_all` writes every key, `clear_all` removes every key
//!
//! A failed disk write never rolls back the in-memory change. It is logged
//! and reported to the caller as `saved == false`.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use shared::{
    split_legacy_status_key, AppConfig, AppSnapshot, Child, ChildColor, FareBreakdown, StatusBook,
    StatusPatch, StatusRecord, UserProfile,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::demo::{demo_children, demo_statuses};
use super::errors::{ImportError, StoreError};
use super::fare::{fare_breakdown, oversized_fare, MAX_FARE};
use super::status::merge_patch;
use crate::storage::{KeyValueStorage, StorageKey};

/// Keys rewritten by an import
pub const IMPORT_KEYS: [StorageKey; 4] = [
    StorageKey::Children,
    StorageKey::Statuses,
    StorageKey::Config,
    StorageKey::User,
];

/// Already validated partial update of a child
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildChanges {
    pub name: Option<String>,
    pub school: Option<String>,
    pub address: Option<String>,
    pub fare_in: Option<u64>,
    pub fare_out: Option<u64>,
    pub days: Option<BTreeSet<u8>>,
    pub color: Option<ChildColor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub children: usize,
    pub statuses: usize,
}

/// Parse a status map in either layout: nested `{childId: {date: record}}`,
/// or the flat `"<childId>_<YYYY-MM-DD>"` layout written by older versions.
///
/// The layout is flat when every key is a legacy key, so an empty legacy
/// record (`{}`) is still imported as a default record.
fn parse_statuses(value: Value) -> Result<StatusBook, String> {
    let Value::Object(entries) = value else {
        return Err("expected a status map".to_string());
    };
    let flat = !entries.is_empty() && entries.keys().all(|key| split_legacy_status_key(key).is_some());

    let mut book = StatusBook::new();
    if flat {
        for (key, record) in entries {
            let record: StatusRecord =
                serde_json::from_value(record).map_err(|e| format!("invalid record '{}': {}", key, e))?;
            if let Some((child_id, date)) = split_legacy_status_key(&key) {
                book.insert(child_id, date, record);
            }
        }
    } else {
        for (child_id, days) in entries {
            let days: BTreeMap<NaiveDate, StatusRecord> =
                serde_json::from_value(days).map_err(|e| format!("invalid records of '{}': {}", child_id, e))?;
            for (date, record) in days {
                book.insert(&child_id, date, record);
            }
        }
    }
    Ok(book)
}

/// Reject imported fares above `MAX_FARE`
fn check_imported_fares(children: Option<&[Child]>, statuses: Option<&StatusBook>) -> Result<(), ImportError> {
    for child in children.unwrap_or_default() {
        if let Some((field, fare)) = oversized_fare(Some(child), None) {
            return Err(ImportError::Malformed {
                key: "children",
                reason: format!("{} {} of '{}' exceeds {}", field, fare, child.id, MAX_FARE),
            });
        }
    }
    for (child_id, date, record) in statuses.into_iter().flat_map(|book| book.iter()) {
        if let Some((field, fare)) = oversized_fare(None, Some(record)) {
            return Err(ImportError::Malformed {
                key: "statuses",
                reason: format!("{} {} of '{}' on {} exceeds {}", field, fare, child_id, date, MAX_FARE),
            });
        }
    }
    Ok(())
}

/// A top-level import key; `null` counts as absent
fn import_key<T: DeserializeOwned>(object: &Map<String, Value>, key: &'static str) -> Result<Option<T>, ImportError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| ImportError::Malformed { key, reason: e.to_string() }),
    }
}

/// In-memory application state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppStore {
    pub children: Vec<Child>,
    pub statuses: StatusBook,
    pub config: AppConfig,
    pub user: UserProfile,
    pub demo_disabled: bool,
}

impl AppStore {
    pub fn child(&self, child_id: &str) -> Option<&Child> {
        self.children.iter().find(|child| child.id == child_id)
    }

    fn require_child(&self, child_id: &str) -> Result<&Child, StoreError> {
        self.child(child_id)
            .ok_or_else(|| StoreError::ChildNotFound(child_id.to_string()))
    }

    pub fn add_child(&mut self, child: Child) {
        self.children.push(child);
    }

    pub fn update_child(&mut self, child_id: &str, changes: ChildChanges) -> Result<Child, StoreError> {
        let child = self
            .children
            .iter_mut()
            .find(|child| child.id == child_id)
            .ok_or_else(|| StoreError::ChildNotFound(child_id.to_string()))?;

        if let Some(name) = changes.name {
            child.name = name;
        }
        if let Some(school) = changes.school {
            child.school = school;
        }
        if let Some(address) = changes.address {
            child.address = address;
        }
        if let Some(fare_in) = changes.fare_in {
            child.fare_in = fare_in;
        }
        if let Some(fare_out) = changes.fare_out {
            child.fare_out = fare_out;
        }
        if let Some(days) = changes.days {
            child.days = days;
        }
        if let Some(color) = changes.color {
            child.color = color;
        }
        Ok(child.clone())
    }

    /// Remove a child and every one of its status records
    pub fn delete_child(&mut self, child_id: &str) -> Result<(Child, usize), StoreError> {
        let index = self
            .children
            .iter()
            .position(|child| child.id == child_id)
            .ok_or_else(|| StoreError::ChildNotFound(child_id.to_string()))?;
        let child = self.children.remove(index);
        let removed = self.statuses.remove_child(child_id);
        Ok((child, removed))
    }

    /// Merge a patch into the child's record for a date
    pub fn set_status(&mut self, child_id: &str, date: NaiveDate, patch: StatusPatch) -> Result<StatusRecord, StoreError> {
        self.require_child(child_id)?;
        let record = merge_patch(self.statuses.get(child_id, date), patch);
        self.statuses.insert(child_id, date, record.clone());
        Ok(record)
    }

    /// Replace the child's record for a date
    pub fn put_status(&mut self, child_id: &str, date: NaiveDate, record: StatusRecord) -> Result<(), StoreError> {
        self.require_child(child_id)?;
        self.statuses.insert(child_id, date, record);
        Ok(())
    }

    pub fn clear_status(&mut self, child_id: &str, date: NaiveDate) -> Result<StatusRecord, StoreError> {
        self.statuses
            .remove(child_id, date)
            .ok_or_else(|| StoreError::StatusNotFound { child_id: child_id.to_string(), date })
    }

    pub fn clear_date_statuses(&mut self, date: NaiveDate) -> usize {
        self.statuses.remove_date(date)
    }

    pub fn breakdown(&self, child_id: &str, date: NaiveDate) -> FareBreakdown {
        fare_breakdown(self.child(child_id), self.statuses.get(child_id, date))
    }

    pub fn export(&self, now: DateTime<Utc>) -> AppSnapshot {
        AppSnapshot {
            children: self.children.clone(),
            statuses: self.statuses.clone(),
            config: self.config.clone(),
            user: self.user.clone(),
            export_date: Some(now),
        }
    }

    /// Replace the keys present in `payload`.
    ///
    /// Every present key is parsed before anything is applied, so a malformed
    /// payload leaves the store untouched.
    pub fn import(&mut self, payload: &Value) -> Result<ImportSummary, ImportError> {
        let object = payload.as_object().ok_or(ImportError::NotAnObject)?;

        let children: Option<Vec<Child>> = import_key(object, "children")?;
        let statuses = match object.get("statuses") {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                parse_statuses(value.clone())
                    .map_err(|reason| ImportError::Malformed { key: "statuses", reason })?,
            ),
        };
        let config: Option<AppConfig> = import_key(object, "config")?;
        let user: Option<UserProfile> = import_key(object, "user")?;
        check_imported_fares(children.as_deref(), statuses.as_ref())?;

        if let Some(children) = children {
            self.children = children;
        }
        if let Some(statuses) = statuses {
            self.statuses = statuses;
        }
        if let Some(config) = config {
            self.config = config;
        }
        if let Some(user) = user {
            self.user = user;
        }

        Ok(ImportSummary {
            children: self.children.len(),
            statuses: self.statuses.len(),
        })
    }

    /// Take over a snapshot wholesale
    pub fn apply_snapshot(&mut self, snapshot: AppSnapshot) {
        self.children = snapshot.children;
        self.statuses = snapshot.statuses;
        self.config = snapshot.config;
        self.user = snapshot.user;
    }

    fn value_for(&self, key: StorageKey) -> serde_json::Result<Value> {
        match key {
            StorageKey::Children => serde_json::to_value(&self.children),
            StorageKey::Statuses => serde_json::to_value(&self.statuses),
            StorageKey::Config => serde_json::to_value(&self.config),
            StorageKey::User => serde_json::to_value(&self.user),
            StorageKey::DemoDisabled => Ok(Value::Bool(self.demo_disabled)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Seed demo children when the store is empty and demo data was never disabled
    pub seed_demo: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self { seed_demo: true }
    }
}

/// Shared, persisted handle to the application state
#[derive(Clone)]
pub struct StoreHandle {
    state: Arc<Mutex<AppStore>>,
    storage: Arc<dyn KeyValueStorage>,
    write_lock: Arc<Mutex<()>>,
    revision: Arc<watch::Sender<u64>>,
}

impl StoreHandle {
    /// Read every key from storage, seeding demo data when appropriate
    pub fn load(storage: Arc<dyn KeyValueStorage>, options: StoreOptions, today: NaiveDate) -> Result<Self> {
        info!("Loading store");

        let mut store = AppStore {
            children: read_key(storage.as_ref(), StorageKey::Children, serde_json::from_value),
            statuses: read_key(storage.as_ref(), StorageKey::Statuses, |value| {
                parse_statuses(value).map_err(serde::de::Error::custom)
            }),
            config: read_key(storage.as_ref(), StorageKey::Config, serde_json::from_value),
            user: read_key(storage.as_ref(), StorageKey::User, serde_json::from_value),
            demo_disabled: read_key(storage.as_ref(), StorageKey::DemoDisabled, serde_json::from_value),
        };

        let seed = options.seed_demo && store.children.is_empty() && !store.demo_disabled;
        if seed {
            info!("No children found, seeding demo data for {}", today);
            store.children = demo_children();
            store.statuses = demo_statuses(&store.children, today);
        }

        info!(
            "Loaded {} children and {} status records",
            store.children.len(),
            store.statuses.len()
        );

        let (revision, _) = watch::channel(0);
        let handle = Self {
            state: Arc::new(Mutex::new(store)),
            storage,
            write_lock: Arc::new(Mutex::new(())),
            revision: Arc::new(revision),
        };

        if seed && !handle.persist(&[StorageKey::Children, StorageKey::Statuses]) {
            warn!("Demo data is only held in memory");
        }

        Ok(handle)
    }

    fn lock(&self) -> MutexGuard<'_, AppStore> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a read-only closure against the current state
    pub fn read<R>(&self, f: impl FnOnce(&AppStore) -> R) -> R {
        f(&self.lock())
    }

    /// Apply a change and persist `keys`; returns the closure result and whether
    /// the write succeeded. Nothing is persisted when the closure fails.
    pub fn mutate<R, E>(
        &self,
        keys: &[StorageKey],
        f: impl FnOnce(&mut AppStore) -> Result<R, E>,
    ) -> Result<(R, bool), E> {
        let result = f(&mut self.lock())?;
        self.revision.send_modify(|revision| *revision += 1);
        Ok((result, self.persist(keys)))
    }

    /// Like `mutate`, without notifying revision subscribers
    pub fn mutate_quiet<R, E>(
        &self,
        keys: &[StorageKey],
        f: impl FnOnce(&mut AppStore) -> Result<R, E>,
    ) -> Result<(R, bool), E> {
        let result = f(&mut self.lock())?;
        Ok((result, self.persist(keys)))
    }

    /// Write every key
    pub fn save_all(&self) -> bool {
        self.persist(&StorageKey::ALL)
    }

    /// Remove every key from storage and reset memory to an empty store
    pub fn clear_all(&self) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        *self.lock() = AppStore::default();
        for key in StorageKey::ALL {
            self.storage.remove(key)?;
        }
        info!("Cleared every stored key");
        Ok(())
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> AppSnapshot {
        self.read(|store| store.export(now))
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    /// Write the current value of each key.
    ///
    /// Values are taken under the write lock, so the last writer always
    /// stores the latest state.
    fn persist(&self, keys: &[StorageKey]) -> bool {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut saved = true;
        for key in keys {
            let value = match self.read(|store| store.value_for(*key)) {
                Ok(value) => value,
                Err(e) => {
                    error!("Failed to serialize {}: {}", key, e);
                    saved = false;
                    continue;
                }
            };
            if let Err(e) = self.storage.write(*key, &value) {
                error!("Failed to save {}: {:#}", key, e);
                saved = false;
            } else {
                debug!("Saved {}", key);
            }
        }
        saved
    }
}

/// Read and decode one key, falling back to the default on missing or bad data
fn read_key<T: Default>(
    storage: &dyn KeyValueStorage,
    key: StorageKey,
    decode: impl FnOnce(Value) -> serde_json::Result<T>,
) -> T {
    match storage.read(key) {
        Ok(Some(value)) => decode(value).unwrap_or_else(|e| {
            warn!("Ignoring unreadable {}: {}", key, e);
            T::default()
        }),
        Ok(None) => T::default(),
        Err(e) => {
            warn!("Failed to read {}: {:#}", key, e);
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_utils::{FailingStorage, TestEnvironment};
    use serde_json::json;
    use shared::{Attendance, PaymentStatus};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn child(id: &str) -> Child {
        Child {
            id: id.to_string(),
            name: format!("Niño {}", id),
            school: "Colegio".to_string(),
            address: String::new(),
            fare_in: 15000,
            fare_out: 15000,
            days: [1, 2, 3, 4, 5].into_iter().collect(),
            color: ChildColor::Blue,
        }
    }

    fn paid() -> StatusPatch {
        StatusPatch { att: Some(Attendance::Attended), pay: Some(PaymentStatus::Paid), ..Default::default() }
    }

    #[test]
    fn test_load_seeds_demo_data_once() {
        let env = TestEnvironment::new().unwrap();
        let today = date(2026, 10, 16);

        let store = StoreHandle::load(env.storage(), StoreOptions::default(), today).unwrap();
        assert_eq!(store.read(|s| s.children.len()), 2);
        assert!(store.read(|s| s.statuses.len()) > 0);
        assert!(env.base_directory().join("children.json").exists());

        // A second load reads the persisted demo data back
        let reloaded = StoreHandle::load(env.storage(), StoreOptions::default(), today).unwrap();
        assert_eq!(
            reloaded.read(|s| s.statuses.clone()),
            store.read(|s| s.statuses.clone())
        );
    }

    #[test]
    fn test_load_skips_demo_when_disabled() {
        let env = TestEnvironment::new().unwrap();
        env.storage().write(StorageKey::DemoDisabled, &json!(true)).unwrap();

        let store = StoreHandle::load(env.storage(), StoreOptions::default(), date(2026, 10, 16)).unwrap();
        assert!(store.read(|s| s.children.is_empty()));
    }

    #[test]
    fn test_mutations_persist_and_bump_revision() {
        let env = TestEnvironment::new().unwrap();
        let store = env.empty_store();
        assert_eq!(store.revision(), 0);

        let (_, saved) = store
            .mutate::<_, StoreError>(&[StorageKey::Children], |s| {
                s.add_child(child("c1"));
                Ok(())
            })
            .unwrap();
        assert!(saved);
        assert_eq!(store.revision(), 1);

        let reloaded = StoreHandle::load(env.storage(), StoreOptions { seed_demo: false }, date(2026, 3, 1)).unwrap();
        assert_eq!(reloaded.read(|s| s.children.clone()), vec![child("c1")]);
    }

    #[test]
    fn test_quiet_mutation_keeps_revision() {
        let env = TestEnvironment::new().unwrap();
        let store = env.empty_store();

        store
            .mutate_quiet::<_, StoreError>(&[StorageKey::Children], |s| {
                s.add_child(child("c1"));
                Ok(())
            })
            .unwrap();
        assert_eq!(store.revision(), 0);
    }

    #[test]
    fn test_failed_write_keeps_memory_state() {
        let store = StoreHandle::load(Arc::new(FailingStorage), StoreOptions { seed_demo: false }, date(2026, 3, 1)).unwrap();

        let (_, saved) = store
            .mutate::<_, StoreError>(&[StorageKey::Children], |s| {
                s.add_child(child("c1"));
                Ok(())
            })
            .unwrap();
        assert!(!saved);
        assert!(store.read(|s| s.child("c1").is_some()));
    }

    #[test]
    fn test_failed_closure_changes_nothing() {
        let env = TestEnvironment::new().unwrap();
        let store = env.empty_store();

        let result = store.mutate(&[StorageKey::Statuses], |s| s.set_status("missing", date(2026, 3, 2), paid()));
        assert_eq!(result, Err(StoreError::ChildNotFound("missing".to_string())));
        assert_eq!(store.revision(), 0);
        assert!(!env.base_directory().join("statuses.json").exists());
    }

    #[test]
    fn test_delete_child_cascades() {
        let mut store = AppStore::default();
        store.add_child(child("c1"));
        store.add_child(child("c2"));
        store.set_status("c1", date(2026, 3, 2), paid()).unwrap();
        store.set_status("c1", date(2026, 3, 3), paid()).unwrap();
        store.set_status("c2", date(2026, 3, 2), paid()).unwrap();

        let (removed_child, removed) = store.delete_child("c1").unwrap();
        assert_eq!(removed_child.id, "c1");
        assert_eq!(removed, 2);
        assert!(store.statuses.child_records("c1").is_none());
        assert_eq!(store.statuses.len(), 1);
    }

    #[test]
    fn test_set_status_merges_and_clear_removes() {
        let mut store = AppStore::default();
        store.add_child(child("c1"));
        let day = date(2026, 3, 2);

        store.set_status("c1", day, paid()).unwrap();
        let merged = store
            .set_status("c1", day, StatusPatch { nota: Some("sin novedad".to_string()), ..Default::default() })
            .unwrap();
        assert_eq!(merged.pay, PaymentStatus::Paid);
        assert_eq!(merged.nota, "sin novedad");
        assert_eq!(store.breakdown("c1", day).total, 30000);

        store.clear_status("c1", day).unwrap();
        assert_eq!(store.breakdown("c1", day).total, 0);
        assert!(matches!(store.clear_status("c1", day), Err(StoreError::StatusNotFound { .. })));
    }

    #[test]
    fn test_clear_date_statuses() {
        let mut store = AppStore::default();
        store.add_child(child("c1"));
        store.add_child(child("c2"));
        store.set_status("c1", date(2026, 3, 2), paid()).unwrap();
        store.set_status("c2", date(2026, 3, 2), paid()).unwrap();
        store.set_status("c2", date(2026, 3, 3), paid()).unwrap();

        assert_eq!(store.clear_date_statuses(date(2026, 3, 2)), 2);
        assert_eq!(store.statuses.len(), 1);
    }

    #[test]
    fn test_export_import_round_trip() {
        let mut store = AppStore::default();
        store.add_child(child("c1"));
        store.set_status("c1", date(2026, 3, 2), paid()).unwrap();
        let snapshot = store.export(Utc::now());

        let mut other = AppStore::default();
        other.import(&serde_json::to_value(&snapshot).unwrap()).unwrap();
        assert_eq!(other.children, store.children);
        assert_eq!(other.statuses, store.statuses);
    }

    #[test]
    fn test_import_accepts_legacy_flat_statuses() {
        let mut store = AppStore::default();
        let summary = store
            .import(&json!({
                "children": [{"id": "c1", "name": "Sofía", "school": "Andes", "fareIn": 15000, "fareOut": 15000, "days": [1, 2], "color": "blue"}],
                "statuses": {
                    "c1_2026-03-02": {"att": "asistio", "pay": "pagado", "nota": ""},
                    "c1_2026-03-03": {"att": "no", "pay": "pendiente", "nota": "enfermo"}
                }
            }))
            .unwrap();

        assert_eq!(summary, ImportSummary { children: 1, statuses: 2 });
        assert_eq!(store.statuses.get("c1", date(2026, 3, 3)).unwrap().nota, "enfermo");
    }

    #[test]
    fn test_import_keeps_empty_legacy_records() {
        let mut store = AppStore::default();
        store
            .import(&json!({
                "statuses": {
                    "c1_2026-03-02": {},
                    "c1_2026-03-03": {"att": "asistio"}
                }
            }))
            .unwrap();

        assert_eq!(store.statuses.len(), 2);
        assert_eq!(store.statuses.get("c1", date(2026, 3, 2)), Some(&StatusRecord::default()));

        // A nested child with no records stays a nested map
        store.import(&json!({"statuses": {"c1": {}}})).unwrap();
        assert!(store.statuses.is_empty());
    }

    #[test]
    fn test_import_rejects_oversized_fares() {
        let mut store = AppStore::default();
        store.add_child(child("c1"));
        let before = store.clone();

        let result = store.import(&json!({
            "children": [{"id": "c9", "name": "Grande", "school": "Andes", "fareIn": u64::MAX, "fareOut": 1, "days": [1], "color": "blue"}]
        }));
        assert!(matches!(result, Err(ImportError::Malformed { key: "children", .. })));

        let result = store.import(&json!({
            "statuses": {"c1": {"2026-03-02": {"att": "asistio", "fareOut": 10_000_001u64}}}
        }));
        assert!(matches!(result, Err(ImportError::Malformed { key: "statuses", .. })));
        assert_eq!(store, before);
    }

    #[test]
    fn test_malformed_import_leaves_state_unchanged() {
        let mut store = AppStore::default();
        store.add_child(child("c1"));
        let before = store.clone();

        let result = store.import(&json!({
            "children": [],
            "statuses": {"not-a-key": {"att": "asistio"}}
        }));
        assert!(matches!(result, Err(ImportError::Malformed { key: "statuses", .. })));
        assert_eq!(store, before);

        assert_eq!(store.import(&json!([1, 2])), Err(ImportError::NotAnObject));
        assert!(matches!(
            store.import(&json!({"children": "nope"})),
            Err(ImportError::Malformed { key: "children", .. })
        ));
        assert_eq!(store, before);
    }

    #[test]
    fn test_import_keeps_absent_keys() {
        let mut store = AppStore::default();
        store.add_child(child("c1"));
        store.config.payment_reminder_days = 5;

        store.import(&json!({"user": {"name": "Ana", "initials": "A"}, "config": null})).unwrap();
        assert_eq!(store.children.len(), 1);
        assert_eq!(store.config.payment_reminder_days, 5);
        assert_eq!(store.user.name, "Ana");
    }

    #[test]
    fn test_clear_all_removes_every_key() {
        let env = TestEnvironment::new().unwrap();
        let store = StoreHandle::load(env.storage(), StoreOptions::default(), date(2026, 10, 16)).unwrap();
        assert!(store.save_all());

        store.clear_all().unwrap();
        assert!(store.read(|s| s.children.is_empty()));
        assert!(!env.base_directory().join("children.json").exists());
        assert!(!env.base_directory().join("config.json").exists());
    }
}
