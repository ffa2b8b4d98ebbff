//! # Sync Service
//!
//! Mirrors the whole-state snapshot to a `RemoteStore`.
//!
//! - **bootstrap**: on start, adopts the remote snapshot if one exists, or
//!   starts the account from an empty route list and pushes it. The user
//!   profile is then named after the account.
//! - **run**: watches the store revision and pushes once the store has been
//!   quiet for the debounce delay; a new change restarts the wait
//!
//! Nothing is pushed before a bootstrap has succeeded, so a remote snapshot
//! that could not be read is never overwritten. Pushes are serialized by a
//! lock that `replace_remote` holds across its local change, so an autosave
//! cannot land between a reset's push and its local wipe.
//!
//! Hydration goes through quiet mutations, so adopting the remote state never
//! schedules a push of that same state. Push failures are logged and dropped;
//! the next change schedules a new attempt.

use anyhow::{bail, Result};
use chrono::Utc;
use shared::{AppSnapshot, UserProfile};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use super::errors::StoreError;
use super::store::{StoreHandle, IMPORT_KEYS};
use crate::storage::{RemoteStore, StorageKey};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(700);
pub const FIRST_RETRY_DELAY: Duration = Duration::from_secs(1);
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// The remote snapshot replaced local state
    Hydrated { children: usize, statuses: usize },
    /// No remote snapshot existed; local routes were cleared and pushed
    Initialized,
}

#[derive(Clone)]
pub struct SyncService {
    store: StoreHandle,
    remote: Arc<dyn RemoteStore>,
    account_id: String,
    display_name: Option<String>,
    debounce: Duration,
    ready: Arc<AtomicBool>,
    push_lock: Arc<Mutex<()>>,
}

impl SyncService {
    pub fn new(store: StoreHandle, remote: Arc<dyn RemoteStore>, account_id: impl Into<String>, debounce: Duration) -> Self {
        Self {
            store,
            remote,
            account_id: account_id.into(),
            display_name: None,
            debounce,
            ready: Arc::new(AtomicBool::new(false)),
            push_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Name given to the user profile after bootstrap instead of the account id
    pub fn with_display_name(mut self, display_name: Option<String>) -> Self {
        self.display_name = display_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        self
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// Profile name for this account: the configured display name, else the account id
    pub fn profile_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.account_id)
    }

    /// Whether a bootstrap has completed and pushes are allowed
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Load the account's remote state into the store
    pub async fn bootstrap(&self) -> Result<BootstrapOutcome> {
        info!("Bootstrapping sync for account {}", self.account_id);

        self.store.mutate_quiet::<_, StoreError>(&[StorageKey::DemoDisabled], |store| {
            store.demo_disabled = true;
            Ok(())
        })?;

        let outcome = match self.remote.fetch(&self.account_id).await? {
            Some(snapshot) => {
                let (outcome, saved) = self.store.mutate_quiet::<_, StoreError>(&IMPORT_KEYS, |store| {
                    store.apply_snapshot(snapshot);
                    Ok(BootstrapOutcome::Hydrated {
                        children: store.children.len(),
                        statuses: store.statuses.len(),
                    })
                })?;
                if !saved {
                    error!("Remote state loaded but not saved locally");
                }
                info!("Hydrated from remote: {:?}", outcome);
                outcome
            }
            None => {
                self.store
                    .mutate_quiet::<_, StoreError>(&[StorageKey::Children, StorageKey::Statuses], |store| {
                        store.children.clear();
                        store.statuses = Default::default();
                        Ok(())
                    })?;
                self.push_current().await?;
                info!("No remote state found, initialized account {}", self.account_id);
                BootstrapOutcome::Initialized
            }
        };

        let profile = UserProfile::from_name(self.profile_name());
        self.store.mutate_quiet::<_, StoreError>(&[StorageKey::User], |store| {
            store.user = profile;
            Ok(())
        })?;

        self.ready.store(true, Ordering::SeqCst);
        Ok(outcome)
    }

    /// Retry `bootstrap` with doubling delays, capped at `max_delay`, until it succeeds
    pub async fn bootstrap_until_ready(&self, first_delay: Duration, max_delay: Duration) -> BootstrapOutcome {
        let mut delay = first_delay;
        loop {
            match self.bootstrap().await {
                Ok(outcome) => return outcome,
                Err(e) => {
                    warn!("Sync bootstrap failed, retrying in {:?}: {:#}", delay, e);
                    sleep(delay).await;
                    delay = (delay * 2).min(max_delay);
                }
            }
        }
    }

    /// Push the current state immediately; refused until bootstrap has succeeded
    pub async fn push_now(&self) -> Result<()> {
        if !self.is_ready() {
            bail!("Sync for account {} has not been bootstrapped", self.account_id);
        }
        self.push_current().await
    }

    /// Push `snapshot`, then run `apply` before any autosave can push again.
    ///
    /// When the push fails `apply` is not run.
    pub async fn replace_remote<R>(&self, snapshot: &AppSnapshot, apply: impl FnOnce() -> Result<R>) -> Result<R> {
        let _guard = self.push_lock.lock().await;
        self.push_snapshot(snapshot).await?;
        apply()
    }

    async fn push_current(&self) -> Result<()> {
        let _guard = self.push_lock.lock().await;
        let snapshot = self.store.snapshot(Utc::now());
        self.push_snapshot(&snapshot).await
    }

    async fn push_snapshot(&self, snapshot: &AppSnapshot) -> Result<()> {
        self.remote.push(&self.account_id, snapshot).await?;
        debug!(
            "Pushed snapshot for {} at revision {}: {} children, {} statuses",
            self.account_id,
            self.store.revision(),
            snapshot.children.len(),
            snapshot.statuses.len()
        );
        Ok(())
    }

    /// Debounced autosave loop; returns when the store is dropped
    pub async fn run(self) {
        let mut revisions = self.store.subscribe();
        info!("Autosave started with {:?} debounce", self.debounce);

        while revisions.changed().await.is_ok() {
            // Wait for a quiet period; every change restarts the timer
            loop {
                match timeout(self.debounce, revisions.changed()).await {
                    Ok(Ok(())) => continue,
                    Ok(Err(_)) | Err(_) => break,
                }
            }

            let revision = *revisions.borrow_and_update();
            if !self.is_ready() {
                warn!("Skipping autosave of revision {}: remote state was never loaded", revision);
                continue;
            }
            match self.push_current().await {
                Ok(()) => info!("Autosaved revision {}", revision),
                Err(e) => error!("Autosave of revision {} failed: {:#}", revision, e),
            }
        }

        info!("Autosave stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_utils::{RecordingRemote, TestEnvironment};
    use shared::{Child, ChildColor};
    use std::sync::atomic::AtomicUsize;

    fn child(id: &str) -> Child {
        Child {
            id: id.to_string(),
            name: format!("Niño {}", id),
            school: "Colegio".to_string(),
            address: String::new(),
            fare_in: 1000,
            fare_out: 1000,
            days: [1].into_iter().collect(),
            color: ChildColor::Blue,
        }
    }

    fn add_child(store: &StoreHandle, id: &str) {
        store
            .mutate::<_, StoreError>(&[StorageKey::Children], |s| {
                s.add_child(child(id));
                Ok(())
            })
            .unwrap();
    }

    fn remote_with(ids: &[&str]) -> RecordingRemote {
        RecordingRemote::holding(AppSnapshot {
            children: ids.iter().map(|id| child(id)).collect(),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_bootstrap_without_remote_clears_and_pushes() {
        let env = TestEnvironment::new().unwrap();
        let store = env.empty_store();
        add_child(&store, "local");
        let remote = Arc::new(RecordingRemote::default());
        let sync = SyncService::new(store.clone(), remote.clone(), "ana", DEFAULT_DEBOUNCE);

        let outcome = sync.bootstrap().await.unwrap();

        assert_eq!(outcome, BootstrapOutcome::Initialized);
        assert!(store.read(|s| s.children.is_empty() && s.demo_disabled));
        assert_eq!(remote.push_count(), 1);
        assert!(sync.is_ready());
    }

    #[tokio::test]
    async fn test_bootstrap_hydrates_from_remote() {
        let env = TestEnvironment::new().unwrap();
        let store = env.empty_store();
        let remote = Arc::new(remote_with(&["remote"]));
        let sync = SyncService::new(store.clone(), remote.clone(), "ana", DEFAULT_DEBOUNCE);
        let revision_before = store.revision();

        let outcome = sync.bootstrap().await.unwrap();

        assert_eq!(outcome, BootstrapOutcome::Hydrated { children: 1, statuses: 0 });
        assert!(store.read(|s| s.child("remote").is_some()));
        assert_eq!(store.revision(), revision_before);
        assert_eq!(remote.push_count(), 0);
    }

    #[tokio::test]
    async fn test_bootstrap_names_profile_after_account() {
        let env = TestEnvironment::new().unwrap();
        let store = env.empty_store();
        let remote = Arc::new(remote_with(&["remote"]));

        let sync = SyncService::new(store.clone(), remote.clone(), "ana@example.com", DEFAULT_DEBOUNCE);
        sync.bootstrap().await.unwrap();
        assert_eq!(store.read(|s| s.user.name.clone()), "ana@example.com");

        let named = sync.with_display_name(Some(" Ana Pérez ".to_string()));
        named.bootstrap().await.unwrap();
        let user = store.read(|s| s.user.clone());
        assert_eq!(user.name, "Ana Pérez");
        assert_eq!(user.initials, "AP");
        assert_eq!(remote.push_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_bootstrap_never_overwrites_remote() {
        let env = TestEnvironment::new().unwrap();
        let store = env.empty_store();
        let remote = Arc::new(remote_with(&["r1", "r2", "r3"]));
        remote.failing_fetches.store(1, Ordering::SeqCst);
        let sync = SyncService::new(store.clone(), remote.clone(), "ana", Duration::from_millis(20));

        assert!(sync.bootstrap().await.is_err());
        assert!(!sync.is_ready());
        let task = tokio::spawn(sync.clone().run());
        tokio::task::yield_now().await;

        add_child(&store, "local");
        tokio::time::sleep(Duration::from_millis(150)).await;
        task.abort();

        assert!(sync.push_now().await.is_err());
        assert_eq!(remote.push_count(), 0);
        assert_eq!(remote.stored().unwrap().children.len(), 3);
    }

    #[tokio::test]
    async fn test_bootstrap_retries_until_remote_answers() {
        let env = TestEnvironment::new().unwrap();
        let store = env.empty_store();
        let remote = Arc::new(remote_with(&["r1", "r2"]));
        remote.failing_fetches.store(2, Ordering::SeqCst);
        let sync = SyncService::new(store.clone(), remote.clone(), "ana", DEFAULT_DEBOUNCE);

        let outcome = sync
            .bootstrap_until_ready(Duration::from_millis(5), Duration::from_millis(10))
            .await;

        assert_eq!(outcome, BootstrapOutcome::Hydrated { children: 2, statuses: 0 });
        assert_eq!(remote.fetches.load(Ordering::SeqCst), 3);
        assert!(sync.is_ready());
    }

    #[tokio::test]
    async fn test_burst_of_changes_pushes_once() {
        let env = TestEnvironment::new().unwrap();
        let store = env.empty_store();
        let remote = Arc::new(RecordingRemote::default());
        let sync = SyncService::new(store.clone(), remote.clone(), "ana", Duration::from_millis(50));
        sync.bootstrap().await.unwrap();
        let pushes_after_bootstrap = remote.push_count();
        let task = tokio::spawn(sync.run());
        tokio::task::yield_now().await;

        add_child(&store, "a");
        tokio::time::sleep(Duration::from_millis(10)).await;
        add_child(&store, "b");
        tokio::time::sleep(Duration::from_millis(10)).await;
        add_child(&store, "c");

        tokio::time::sleep(Duration::from_millis(300)).await;
        task.abort();

        assert_eq!(remote.push_count(), pushes_after_bootstrap + 1);
        assert_eq!(remote.stored().unwrap().children.len(), 3);
    }

    #[tokio::test]
    async fn test_hydration_is_not_echoed() {
        let env = TestEnvironment::new().unwrap();
        let store = env.empty_store();
        let remote = Arc::new(remote_with(&["remote"]));
        let sync = SyncService::new(store.clone(), remote.clone(), "ana", Duration::from_millis(20));
        let task = tokio::spawn(sync.clone().run());
        tokio::task::yield_now().await;

        sync.bootstrap().await.unwrap();
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(remote.push_count(), 0);

        add_child(&store, "local");
        tokio::time::sleep(Duration::from_millis(150)).await;
        task.abort();
        assert_eq!(remote.push_count(), 1);
    }

    #[tokio::test]
    async fn test_replace_remote_holds_off_autosave() {
        let env = TestEnvironment::new().unwrap();
        let store = env.empty_store();
        let remote = Arc::new(RecordingRemote {
            push_delay: Some(Duration::from_millis(60)),
            ..remote_with(&[])
        });
        let sync = SyncService::new(store.clone(), remote.clone(), "ana", Duration::from_millis(10));
        sync.bootstrap().await.unwrap();
        let task = tokio::spawn(sync.clone().run());
        tokio::task::yield_now().await;

        // The debounce expires while the empty push is still in flight
        add_child(&store, "old");
        let applied = AtomicUsize::new(0);
        sync.replace_remote(&AppSnapshot::default(), || {
            applied.fetch_add(store.read(|s| s.children.len()), Ordering::SeqCst);
            store.clear_all()
        })
        .await
        .unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        task.abort();

        assert_eq!(applied.load(Ordering::SeqCst), 1);
        assert!(remote.stored().unwrap().children.is_empty());
    }
}
