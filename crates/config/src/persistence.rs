//! Reading and atomically writing the config file

use crate::{Config, ConfigError, ConfigResult, CONFIG_VERSION};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Reads and writes one config file
pub struct ConfigPersistence {
    config_path: PathBuf,
}

impl ConfigPersistence {
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// Loads the file; a missing file yields the defaults.
    ///
    /// An empty file is an error. Out-of-range values are logged, not
    /// rejected, so they can still be fixed by hand.
    pub fn load(&self) -> ConfigResult<Config> {
        if !self.config_path.exists() {
            log::info!(
                "Config file not found at {}, using defaults",
                self.config_path.display()
            );
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(&self.config_path).map_err(|e| ConfigError::ReadError {
            path: self.config_path.clone(),
            source: e,
        })?;

        if contents.trim().is_empty() {
            return Err(ConfigError::ReadError {
                path: self.config_path.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "Config file is empty or contains only whitespace",
                ),
            });
        }

        let config: Config = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: self.config_path.clone(),
            source: e,
        })?;

        if config.version > CONFIG_VERSION {
            log::warn!(
                "Config version {} is newer than supported version {}",
                config.version,
                CONFIG_VERSION
            );
        }

        if let Err(errors) = config.validate() {
            log::warn!("Config validation warnings: {}", join_errors(&errors));
        }

        Ok(config)
    }

    /// Validates, backs up the previous file, then writes atomically
    pub fn save(&self, config: &Config) -> ConfigResult<()> {
        if let Err(errors) = config.validate() {
            return Err(ConfigError::ValidationError(join_errors(&errors)));
        }

        if let Some(parent) = self.config_path.parent() {
            ensure_directory_exists(parent)?;
        }

        if self.config_path.exists() {
            self.backup()?;
        }

        let text = toml::to_string_pretty(config)?;
        self.write_atomic(&text)?;

        log::info!("Config saved to {}", self.config_path.display());
        Ok(())
    }

    /// Path of the copy kept from the previous save
    pub fn backup_path(&self) -> PathBuf {
        self.config_path.with_extension("toml.backup")
    }

    fn backup(&self) -> ConfigResult<()> {
        let backup_path = self.backup_path();
        fs::copy(&self.config_path, &backup_path).map_err(|e| ConfigError::BackupError { source: e })?;
        log::debug!("Backed up config to {}", backup_path.display());
        Ok(())
    }

    fn write_atomic(&self, content: &str) -> ConfigResult<()> {
        let dir = self
            .config_path
            .parent()
            .ok_or_else(|| ConfigError::PathResolutionError {
                reason: "Config path has no parent directory".to_string(),
            })?;

        let mut temp_file = NamedTempFile::new_in(dir)?;
        temp_file.write_all(content.as_bytes())?;
        temp_file.flush()?;
        temp_file
            .persist(&self.config_path)
            .map_err(|e| ConfigError::WriteError {
                path: self.config_path.clone(),
                source: e.error,
            })?;
        Ok(())
    }
}

fn ensure_directory_exists(path: &Path) -> ConfigResult<()> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| ConfigError::DirectoryCreationError {
            path: path.to_path_buf(),
            source: e,
        })?;
        log::info!("Created config directory: {}", path.display());
    }
    Ok(())
}

fn join_errors(errors: &[crate::ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, ConfigPersistence) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let persistence = ConfigPersistence::new(temp_dir.path().join("config.toml"));
        (temp_dir, persistence)
    }

    #[test]
    fn test_missing_file_is_default() {
        let (_temp_dir, persistence) = setup();
        assert_eq!(persistence.load().unwrap(), Config::default());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let (_temp_dir, persistence) = setup();
        let mut config = Config::default();
        config.sync.interval_secs = 900;
        config.app.device_id = Some("urn:uuid:device".to_string());

        persistence.save(&config).unwrap();

        assert_eq!(persistence.load().unwrap(), config);
    }

    #[test]
    fn test_save_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");
        let persistence = ConfigPersistence::new(path.clone());

        persistence.save(&Config::default()).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_second_save_keeps_backup() {
        let (_temp_dir, persistence) = setup();
        persistence.save(&Config::default()).unwrap();
        persistence.save(&Config::default()).unwrap();
        assert!(persistence.backup_path().exists());
    }

    #[test]
    fn test_empty_file_is_rejected() {
        let (_temp_dir, persistence) = setup();
        fs::write(&persistence.config_path, "   \n").unwrap();
        assert!(matches!(persistence.load(), Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let (_temp_dir, persistence) = setup();
        fs::write(&persistence.config_path, "[sync\ninterval_secs = ").unwrap();
        assert!(matches!(persistence.load(), Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_invalid_config_is_not_saved() {
        let (_temp_dir, persistence) = setup();
        let mut config = Config::default();
        config.network.timeout_secs = 0;

        assert!(matches!(
            persistence.save(&config),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(!persistence.config_path.exists());
    }

    #[test]
    fn test_out_of_range_file_still_loads() {
        let (_temp_dir, persistence) = setup();
        fs::write(&persistence.config_path, "[sync]\ninterval_secs = 5\n").unwrap();
        assert_eq!(persistence.load().unwrap().sync.interval_secs, 5);
    }
}
