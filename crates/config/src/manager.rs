//! Config manager: locating, loading and updating the config file

use crate::persistence::ConfigPersistence;
use crate::{Config, ConfigError, ConfigResult, LogLevel};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Overrides `app.log_level`
pub const ENV_LOG_LEVEL: &str = "PAGEMARK_LOG_LEVEL";

/// Overrides `sync.interval_secs`
pub const ENV_SYNC_INTERVAL_SECS: &str = "PAGEMARK_SYNC_INTERVAL_SECS";

const CONFIG_FILE: &str = "config.toml";

/// Entry point for reading and writing configuration
pub struct ConfigManager {
    persistence: ConfigPersistence,
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Uses the platform config directory:
    /// - Linux: `~/.config/pagemark/`
    /// - macOS: `~/Library/Application Support/pagemark/`
    /// - Windows: `%APPDATA%\pagemark\`
    pub fn new() -> ConfigResult<Self> {
        let config_dir = Self::default_config_dir()?;
        Self::with_directory(config_dir)
    }

    pub fn with_directory(config_dir: PathBuf) -> ConfigResult<Self> {
        let persistence = ConfigPersistence::new(config_dir.join(CONFIG_FILE));
        Ok(Self {
            persistence,
            config_dir,
        })
    }

    fn default_config_dir() -> ConfigResult<PathBuf> {
        ProjectDirs::from("", "", "pagemark")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or_else(|| ConfigError::PathResolutionError {
                reason: "Could not determine user config directory".to_string(),
            })
    }

    pub fn config_dir(&self) -> &PathBuf {
        &self.config_dir
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    /// Missing file gives defaults; a corrupt one is an error
    pub fn load(&self) -> ConfigResult<Config> {
        self.persistence.load()
    }

    /// Never fails; load errors are logged and the defaults returned
    pub fn load_or_default(&self) -> Config {
        match self.load() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config: {}, using defaults", e);
                Config::default()
            }
        }
    }

    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        self.persistence.save(config)
    }

    /// Load, apply `update_fn`, save
    ///
    /// ```rust
    /// # use pagemark_config::ConfigManager;
    /// # let dir = tempfile::tempdir().unwrap();
    /// # let manager = ConfigManager::with_directory(dir.path().to_path_buf()).unwrap();
    /// manager.update(|config| config.sync.interval_secs = 600).unwrap();
    /// assert_eq!(manager.load().unwrap().sync.interval_secs, 600);
    /// ```
    pub fn update<F>(&self, update_fn: F) -> ConfigResult<()>
    where
        F: FnOnce(&mut Config),
    {
        let mut config = self.load()?;
        update_fn(&mut config);
        self.save(&config)
    }

    /// Writes a config file with a fresh device id if none exists.
    ///
    /// Returns `Ok(true)` if a file was created. An existing file without a
    /// device id gets one.
    pub fn initialize(&self) -> ConfigResult<bool> {
        if self.config_path().exists() {
            let mut config = self.load()?;
            if config.app.ensure_device_id() {
                log::info!("Assigned device id to existing config");
                self.save(&config)?;
            }
            return Ok(false);
        }

        let mut config = Config::default();
        config.app.ensure_device_id();
        self.save(&config)?;
        Ok(true)
    }

    /// Overwrites the file with defaults, keeping the device id
    pub fn reset(&self) -> ConfigResult<()> {
        let device_id = self.load().ok().and_then(|c| c.app.device_id);
        let mut config = Config::default();
        config.app.device_id = device_id;
        self.save(&config)
    }

    /// Problems in the current file, empty if valid
    pub fn validate(&self) -> ConfigResult<Vec<String>> {
        let config = self.load()?;
        match config.validate() {
            Ok(()) => Ok(Vec::new()),
            Err(errors) => Ok(errors.iter().map(|e| e.to_string()).collect()),
        }
    }

    /// Loads the file, then applies `PAGEMARK_*` environment overrides
    pub fn load_with_env_overrides(&self) -> ConfigResult<Config> {
        let mut config = self.load()?;
        apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;

        if let Err(errors) = config.validate() {
            log::warn!(
                "Config validation warnings after env overrides: {:?}",
                errors
            );
        }
        Ok(config)
    }
}

/// Applies overrides found through `lookup`; unparsable values are errors
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(ENV_LOG_LEVEL) {
        config.app.log_level =
            value
                .parse::<LogLevel>()
                .map_err(|_| ConfigError::InvalidOverride {
                    variable: ENV_LOG_LEVEL.to_string(),
                    value: value.clone(),
                })?;
        log::debug!("Log level overridden to {}", config.app.log_level);
    }

    if let Some(value) = lookup(ENV_SYNC_INTERVAL_SECS) {
        config.sync.interval_secs =
            value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidOverride {
                    variable: ENV_SYNC_INTERVAL_SECS.to_string(),
                    value: value.clone(),
                })?;
        log::debug!("Sync interval overridden to {}s", config.sync.interval_secs);
    }

    Ok(())
}
