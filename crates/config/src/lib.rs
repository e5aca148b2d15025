//! Pagemark configuration
//!
//! A TOML file in the platform config directory, split into sections that
//! each implement [`ConfigSection`]:
//!
//! - `app`: log level and device id
//! - `sync`: periodic sync timing and remote failure policy
//! - `network`: HTTP client timeout and user agent
//!
//! Missing files and fields fall back to defaults. Writes are atomic and
//! validated first. `PAGEMARK_LOG_LEVEL` and `PAGEMARK_SYNC_INTERVAL_SECS`
//! override the file.
//!
//! # Example
//!
//! ```rust
//! use pagemark_config::ConfigManager;
//!
//! let dir = tempfile::tempdir().unwrap();
//! let manager = ConfigManager::with_directory(dir.path().to_path_buf()).unwrap();
//! let config = manager.load_or_default();
//! assert_eq!(config.sync.interval_secs, 3600);
//! ```

mod error;
mod manager;
mod persistence;
mod validation;

pub mod app_config;
pub mod network_config;
pub mod sync_config;

pub use app_config::{AppConfig, LogLevel};
pub use error::{ConfigError, ConfigResult, ValidationError};
pub use manager::{apply_env_overrides, ConfigManager, ENV_LOG_LEVEL, ENV_SYNC_INTERVAL_SECS};
pub use network_config::NetworkConfig;
pub use sync_config::SyncConfig;
pub use validation::{ConfigSection, Validator};

use serde::{Deserialize, Serialize};

/// Current config file format version
pub const CONFIG_VERSION: u32 = 1;

/// The whole config file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// File format version
    pub version: u32,
    pub app: AppConfig,
    pub sync: SyncConfig,
    pub network: NetworkConfig,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates every section, returning all problems found
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        for result in [self.app.validate(), self.sync.validate(), self.network.validate()] {
            if let Err(mut section) = result {
                errors.append(&mut section);
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Takes every value from `other`
    pub fn merge(&mut self, other: Config) {
        self.app.merge(other.app);
        self.sync.merge(other.sync);
        self.network.merge(other.network);
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            app: AppConfig::default(),
            sync: SyncConfig::default(),
            network: NetworkConfig::default(),
        }
    }
}
