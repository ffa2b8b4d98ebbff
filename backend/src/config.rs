//! Server configuration.
//!
//! Read from a YAML file, then overridden by environment variables:
//!
//! - `RUTAKIDS_CONFIG`: explicit config file, which must exist
//! - `RUTAKIDS_DATA_DIR`: data directory; `rutakids.yaml` inside it is used
//!   when no explicit file is given
//! - `RUTAKIDS_BIND`, `RUTAKIDS_PORT`: listen address
//! - `RUTAKIDS_SYNC_DIR`, `RUTAKIDS_ACCOUNT`: remote snapshot mirror
//! - `RUTAKIDS_DISPLAY_NAME`: profile name for the synced account

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

pub const CONFIG_ENV: &str = "RUTAKIDS_CONFIG";
pub const DATA_DIR_ENV: &str = "RUTAKIDS_DATA_DIR";
pub const BIND_ENV: &str = "RUTAKIDS_BIND";
pub const PORT_ENV: &str = "RUTAKIDS_PORT";
pub const SYNC_DIR_ENV: &str = "RUTAKIDS_SYNC_DIR";
pub const ACCOUNT_ENV: &str = "RUTAKIDS_ACCOUNT";
pub const DISPLAY_NAME_ENV: &str = "RUTAKIDS_DISPLAY_NAME";

const CONFIG_FILE_NAME: &str = "rutakids.yaml";
const DEFAULT_DEBOUNCE_MS: u64 = 700;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid port '{0}'")]
    InvalidPort(String),

    #[error("Sync directory is set but no account id was given")]
    MissingAccount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    pub remote_dir: PathBuf,
    pub account_id: String,
    /// Profile name set after bootstrap; the account id when absent
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl SyncConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub data_dir: PathBuf,
    pub bind: String,
    pub port: u16,
    pub cors_origin: String,
    /// Seed two demo children on a first start
    pub seed_demo: bool,
    /// Frontend build served for every non-API path
    pub static_dir: Option<PathBuf>,
    pub sync: Option<SyncConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            bind: "127.0.0.1".to_string(),
            port: 3000,
            cors_origin: "http://localhost:8080".to_string(),
            seed_demo: true,
            static_dir: None,
            sync: None,
        }
    }
}

/// `<Documents>/RutaKids`, falling back to the home directory
pub fn default_data_dir() -> PathBuf {
    dirs::document_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("RutaKids")
}

impl ServerConfig {
    /// Load from the process environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load with a custom variable lookup
    pub fn load_with(env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = match env(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => {
                let data_dir = env(DATA_DIR_ENV).map(PathBuf::from).unwrap_or_else(default_data_dir);
                let path = data_dir.join(CONFIG_FILE_NAME);
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_overrides(&env)?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    fn apply_overrides(&mut self, env: &impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(data_dir) = env(DATA_DIR_ENV) {
            self.data_dir = PathBuf::from(data_dir);
        }
        if let Some(bind) = env(BIND_ENV) {
            self.bind = bind;
        }
        if let Some(port) = env(PORT_ENV) {
            self.port = port.trim().parse().map_err(|_| ConfigError::InvalidPort(port))?;
        }

        if let Some(remote_dir) = env(SYNC_DIR_ENV) {
            let sync = self.sync.get_or_insert_with(|| SyncConfig {
                remote_dir: PathBuf::new(),
                account_id: String::new(),
                display_name: None,
                debounce_ms: DEFAULT_DEBOUNCE_MS,
            });
            sync.remote_dir = PathBuf::from(remote_dir);
        }
        if let (Some(sync), Some(account)) = (self.sync.as_mut(), env(ACCOUNT_ENV)) {
            sync.account_id = account;
        }
        if let (Some(sync), Some(name)) = (self.sync.as_mut(), env(DISPLAY_NAME_ENV)) {
            sync.display_name = Some(name);
        }

        if matches!(&self.sync, Some(sync) if sync.account_id.trim().is_empty()) {
            return Err(ConfigError::MissingAccount);
        }
        Ok(())
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}
