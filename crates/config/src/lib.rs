#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for upm
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/upm/config.toml)
//! - Environment variables
//! - CLI flags

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use upm_errors::{ConfigError, Error};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub queue: QueueConfig,

    #[serde(default)]
    pub elevation: ElevationConfig,

    /// Per-manager overrides, keyed by manager name
    #[serde(default)]
    pub managers: HashMap<String, ManagerOverrides>,
}

/// Scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// How many operations may run at the same time
    #[serde(default = "default_max_parallel_operations")]
    pub max_parallel_operations: usize,
    /// How often a queued operation re-checks its position
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Elevation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElevationConfig {
    /// Keep cached admin credentials alive between operations
    #[serde(default)]
    pub cache_admin_rights: bool,
    /// Keep cached admin credentials alive for a whole batch
    #[serde(default)]
    pub cache_admin_rights_for_batches: bool,
    /// Helper binary prefixed to commands that need elevation
    #[serde(default = "default_elevator")]
    pub elevator: PathBuf,
}

/// Per-manager configuration overrides
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ManagerOverrides {
    /// Operations of this manager bypass the global queue
    #[serde(default)]
    pub allow_parallel_operations: bool,
    /// Always run this manager's operations elevated
    #[serde(default)]
    pub always_elevate: bool,
    /// Use this executable instead of the one found on PATH
    #[serde(default)]
    pub executable_path: Option<PathBuf>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_parallel_operations: 1,
            poll_interval_ms: 100,
        }
    }
}

impl Default for ElevationConfig {
    fn default() -> Self {
        Self {
            cache_admin_rights: false,
            cache_admin_rights_for_batches: false,
            elevator: PathBuf::from("sudo"),
        }
    }
}

// Default value functions for serde

fn default_max_parallel_operations() -> usize {
    1
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_elevator() -> PathBuf {
    PathBuf::from("sudo")
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("upm").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::ReadError {
                path: path.display().to_string(),
                error: e.to_string(),
            })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // UPM_MAX_PARALLEL
        if let Ok(parallel) = std::env::var("UPM_MAX_PARALLEL") {
            self.queue.max_parallel_operations =
                parallel.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "UPM_MAX_PARALLEL".to_string(),
                    value: parallel,
                })?;
        }

        // UPM_ELEVATOR
        if let Ok(elevator) = std::env::var("UPM_ELEVATOR") {
            self.elevation.elevator = PathBuf::from(elevator);
        }

        self.validate()?;
        Ok(())
    }

    /// Check that configured values are usable
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for a zero concurrency ceiling
    /// or an unusably small poll interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue.max_parallel_operations == 0 {
            return Err(ConfigError::InvalidValue {
                field: "queue.max_parallel_operations".to_string(),
                value: "0".to_string(),
            });
        }
        if self.queue.poll_interval_ms < 10 {
            return Err(ConfigError::InvalidValue {
                field: "queue.poll_interval_ms".to_string(),
                value: self.queue.poll_interval_ms.to_string(),
            });
        }
        Ok(())
    }

    /// Overrides for the given manager, or defaults when none are configured
    #[must_use]
    pub fn manager_overrides(&self, manager: &str) -> ManagerOverrides {
        self.managers.get(manager).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.queue.max_parallel_operations, 1);
        assert_eq!(config.queue.poll_interval_ms, 100);
        assert!(!config.elevation.cache_admin_rights);
        assert_eq!(config.elevation.elevator, PathBuf::from("sudo"));
    }

    #[test]
    fn test_parse_toml() {
        let config: Config = toml::from_str(
            r#"
            [queue]
            max_parallel_operations = 3

            [managers.scoop]
            allow_parallel_operations = true
            "#,
        )
        .unwrap();
        assert_eq!(config.queue.max_parallel_operations, 3);
        assert_eq!(config.queue.poll_interval_ms, 100);
        assert!(config.manager_overrides("scoop").allow_parallel_operations);
        assert!(!config.manager_overrides("winget").allow_parallel_operations);
    }

    #[test]
    fn test_validate_rejects_zero_ceiling() {
        let mut config = Config::default();
        config.queue.max_parallel_operations = 0;
        assert!(config.validate().is_err());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[queue]\nmax_parallel_operations = 2\n").unwrap();

        let config = Config::load_from_file(&path).await.unwrap();
        assert_eq!(config.queue.max_parallel_operations, 2);
    }

    #[tokio::test]
    async fn test_load_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        assert!(Config::load_from_file(&path).await.is_err());
    }
}
