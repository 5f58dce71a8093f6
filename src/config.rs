//! Miner configuration
//!
//! Settings come from an optional JSON file; command-line flags override
//! individual fields after loading.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::algorithm::SearchConfig;

/// Default seconds between hash-rate lines during a search
pub const DEFAULT_REPORT_INTERVAL_SECS: u64 = 5;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Miner settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    /// Search workers; `None` uses every logical CPU
    pub threads: Option<usize>,
    /// Materialize the full dataset before searching instead of light lookups
    pub full_dataset: bool,
    /// Print JSON reports instead of text
    pub json: bool,
    /// Seconds between progress lines; 0 disables them
    pub report_interval_secs: u64,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            threads: None,
            full_dataset: false,
            json: false,
            report_interval_secs: DEFAULT_REPORT_INTERVAL_SECS,
        }
    }
}

impl MinerConfig {
    /// Load from a JSON file. Missing fields take their default.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, else the default path if it exists, else defaults.
    #[cfg(feature = "cli")]
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default = default_config_path();
                if default.exists() {
                    Self::load(&default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == Some(0) {
            return Err(ConfigError::Invalid("threads must be >= 1".into()));
        }
        Ok(())
    }

    /// Search tuning derived from this configuration.
    pub fn search_config(&self) -> SearchConfig {
        SearchConfig::with_threads(self.threads.unwrap_or_else(default_threads))
    }
}

#[cfg(feature = "cli")]
fn default_threads() -> usize {
    num_cpus::get()
}

#[cfg(not(feature = "cli"))]
fn default_threads() -> usize {
    SearchConfig::default().threads
}

/// Get the default config file path
#[cfg(feature = "cli")]
pub fn default_config_path() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("ethash").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = MinerConfig::default();
        assert_eq!(config.threads, None);
        assert!(!config.full_dataset);
        assert_eq!(config.report_interval_secs, DEFAULT_REPORT_INTERVAL_SECS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = write_config(r#"{ "threads": 3, "full_dataset": true }"#);
        let config = MinerConfig::load(file.path()).unwrap();

        assert_eq!(config.threads, Some(3));
        assert!(config.full_dataset);
        assert!(!config.json);
        assert_eq!(config.report_interval_secs, DEFAULT_REPORT_INTERVAL_SECS);
        assert_eq!(config.search_config().threads, 3);
    }

    #[test]
    fn test_zero_threads_rejected() {
        let file = write_config(r#"{ "threads": 0 }"#);
        assert!(matches!(
            MinerConfig::load(file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_bad_json_reports_path() {
        let file = write_config("{ threads: ");
        let err = MinerConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = MinerConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_round_trip_json() {
        let config = MinerConfig {
            threads: Some(8),
            full_dataset: true,
            json: true,
            report_interval_secs: 0,
        };
        let text = serde_json::to_string(&config).unwrap();
        let back: MinerConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
