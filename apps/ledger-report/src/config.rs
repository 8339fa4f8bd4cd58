//! # App Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SIMLEDGER_DB_PATH=/srv/ledger.db                                   │
//! │     SIMLEDGER_LOW_STOCK_THRESHOLD=30                                   │
//! │     SIMLEDGER_CACHE_BUCKET_SECS=120                                    │
//! │                                                                         │
//! │  2. TOML Config File (--config <path>, or the platform default)        │
//! │     ~/.config/simledger/ledger.toml (Linux)                            │
//! │     ~/Library/Application Support/com.simledger.simledger/ledger.toml  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/srv/simledger/ledger.db"
//! max_connections = 5
//!
//! [engine]
//! low_stock_threshold = 50
//! collection_horizon_days = 7
//! cache_bucket_secs = 60
//!
//! [engine.debt]
//! warning_change_count = 3
//! recovery_change_count = 4
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::ConfigError;
use simledger_core::EngineConfig;

const CONFIG_FILE: &str = "ledger.toml";
const DATABASE_FILE: &str = "ledger.db";

/// Database location and pool size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Defaults to `ledger.db` in the platform data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
        }
    }
}

/// Complete app configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub engine: EngineConfig,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// An explicit `config_path` must exist; the platform default may be
    /// missing, in which case defaults are used.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                Some(path) => {
                    debug!(?path, "Config file not found, using defaults");
                    Self::default()
                }
                None => Self::default(),
            },
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        info!(?path, "Loading config from file");
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Applies `SIMLEDGER_*` overrides read through `lookup`.
    ///
    /// Unparsable numbers are ignored with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("SIMLEDGER_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(value) = lookup("SIMLEDGER_LOW_STOCK_THRESHOLD") {
            match value.parse::<i64>() {
                Ok(threshold) => self.engine.low_stock_threshold = threshold,
                Err(_) => warn!(value = %value, "Ignoring invalid SIMLEDGER_LOW_STOCK_THRESHOLD"),
            }
        }

        if let Some(value) = lookup("SIMLEDGER_CACHE_BUCKET_SECS") {
            match value.parse::<u64>() {
                Ok(secs) => self.engine.cache_bucket_secs = secs,
                Err(_) => warn!(value = %value, "Ignoring invalid SIMLEDGER_CACHE_BUCKET_SECS"),
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        self.engine
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// The configured database path, or `ledger.db` in the platform data
    /// directory (created if missing).
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }

        let dirs = Self::project_dirs().ok_or(ConfigError::NoDataDir)?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        Ok(data_dir.join(DATABASE_FILE))
    }

    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("com", "simledger", "simledger")
    }
}
