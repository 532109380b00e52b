//! Configuration for cohort cadence.

use crate::clock::SystemClock;
use crate::core::DEFAULT_DAILY_LIMIT;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const APP_DIR: &str = "cohort-cadence";

/// Main configuration for the tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path of the JSON record store
    pub store_path: PathBuf,

    /// IANA timezone used to decide what "today" is
    pub timezone: String,

    /// Parameters used when a report flag is omitted
    pub defaults: ReportDefaults,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);

        Self {
            store_path: data_dir.join("cadence.json"),
            timezone: "UTC".to_string(),
            defaults: ReportDefaults::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults when the
    /// file does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content).map_err(ConfigError::Parse)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.json")
    }

    /// Parse the configured timezone.
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .trim()
            .parse::<Tz>()
            .map_err(|_| ConfigError::InvalidTimezone(self.timezone.clone()))
    }

    /// Wall clock in the configured timezone.
    pub fn clock(&self) -> Result<SystemClock, ConfigError> {
        Ok(SystemClock::new(self.tz()?))
    }
}

/// Fallback values for report parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportDefaults {
    pub lookback_days: u32,
    pub lookahead_days: u32,
    pub stale_days: u32,
    pub target_gap_days: u32,
    pub weeks: u32,
    pub upcoming_days: u32,
    pub balance_threshold: f64,
    pub daily_limit: u32,
    pub max_gap_days: Option<u32>,
    pub weekly_limit: Option<u32>,
}

impl Default for ReportDefaults {
    fn default() -> Self {
        Self {
            lookback_days: 30,
            lookahead_days: 30,
            stale_days: 21,
            target_gap_days: 21,
            weeks: 8,
            upcoming_days: 30,
            balance_threshold: 0.25,
            daily_limit: DEFAULT_DAILY_LIMIT,
            max_gap_days: None,
            weekly_limit: None,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(serde_json::Error),
    #[error("Serialize error: {0}")]
    Serialize(serde_json::Error),
    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),
}
