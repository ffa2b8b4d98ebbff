//! # Storage Traits
//!
//! Abstractions over where RutaKids state lives, so the domain layer can work
//! with the local JSON files, a remote mirror, or a test double.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use shared::AppSnapshot;
use std::fmt;

/// Keys of the local key/value store, one JSON document each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Children,
    Statuses,
    Config,
    User,
    DemoDisabled,
}

impl StorageKey {
    pub const ALL: [StorageKey; 5] = [
        StorageKey::Children,
        StorageKey::Statuses,
        StorageKey::Config,
        StorageKey::User,
        StorageKey::DemoDisabled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::Children => "children",
            StorageKey::Statuses => "statuses",
            StorageKey::Config => "config",
            StorageKey::User => "user",
            StorageKey::DemoDisabled => "demo_disabled",
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Local persistence of the store's top-level keys
///
/// Implementations are synchronous; writes are small JSON documents.
pub trait KeyValueStorage: Send + Sync {
    /// Read a key, `None` when it was never written
    fn read(&self, key: StorageKey) -> Result<Option<Value>>;

    /// Replace the value of a key
    fn write(&self, key: StorageKey, value: &Value) -> Result<()>;

    /// Remove a key; removing a missing key is not an error
    fn remove(&self, key: StorageKey) -> Result<()>;
}

/// Remote copy of the whole-state snapshot, one per account
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Latest snapshot pushed for the account, if any
    async fn fetch(&self, account_id: &str) -> Result<Option<AppSnapshot>>;

    /// Replace the account's snapshot
    async fn push(&self, account_id: &str, snapshot: &AppSnapshot) -> Result<()>;
}
