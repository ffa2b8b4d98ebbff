use anyhow::{Context, Result};
use async_trait::async_trait;
use shared::AppSnapshot;
use std::path::Path;
use tracing::{debug, info};

use super::connection::JsonConnection;
use crate::storage::traits::RemoteStore;

/// Remote snapshots kept as one JSON document per account inside a mirrored
/// directory, e.g. a folder synchronized by a cloud drive client.
#[derive(Debug, Clone)]
pub struct DirectoryRemoteStore {
    connection: JsonConnection,
}

impl DirectoryRemoteStore {
    pub fn new<P: AsRef<Path>>(remote_dir: P) -> Result<Self> {
        let connection = JsonConnection::new(remote_dir)?;
        info!("Remote snapshot directory: {}", connection.base_directory().display());
        Ok(Self { connection })
    }

    /// Account ids become file names, so anything outside [A-Za-z0-9_-] is replaced
    fn document_name(account_id: &str) -> String {
        let name: String = account_id
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        format!("rutakids_{}", name)
    }
}

#[async_trait]
impl RemoteStore for DirectoryRemoteStore {
    async fn fetch(&self, account_id: &str) -> Result<Option<AppSnapshot>> {
        let connection = self.connection.clone();
        let name = Self::document_name(account_id);
        debug!("Fetching remote snapshot {}", name);

        let value = tokio::task::spawn_blocking(move || connection.read_document(&name))
            .await
            .context("Remote read task failed")??;

        value
            .map(|value| serde_json::from_value(value).context("Remote snapshot is malformed"))
            .transpose()
    }

    async fn push(&self, account_id: &str, snapshot: &AppSnapshot) -> Result<()> {
        let connection = self.connection.clone();
        let name = Self::document_name(account_id);
        let value = serde_json::to_value(snapshot)?;
        debug!("Pushing remote snapshot {}", name);

        tokio::task::spawn_blocking(move || connection.write_document(&name, &value))
            .await
            .context("Remote write task failed")?
    }
}
