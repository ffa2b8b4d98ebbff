use anyhow::Result;
use serde_json::Value;
use tracing::debug;

use super::connection::JsonConnection;
use crate::storage::traits::{KeyValueStorage, StorageKey};

/// Stores each top-level key as `<data_dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct JsonKeyValueRepository {
    connection: JsonConnection,
}

impl JsonKeyValueRepository {
    pub fn new(connection: JsonConnection) -> Self {
        Self { connection }
    }
}

impl KeyValueStorage for JsonKeyValueRepository {
    fn read(&self, key: StorageKey) -> Result<Option<Value>> {
        debug!("Reading key: {}", key);
        self.connection.read_document(key.as_str())
    }

    fn write(&self, key: StorageKey, value: &Value) -> Result<()> {
        debug!("Writing key: {}", key);
        self.connection.write_document(key.as_str(), value)
    }

    fn remove(&self, key: StorageKey) -> Result<()> {
        debug!("Removing key: {}", key);
        self.connection.remove_document(key.as_str())
    }
}
