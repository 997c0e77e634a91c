//! Optional TOML configuration.
//!
//! ```toml
//! [sync]
//! poll_interval_ms = 150
//!
//! [logging]
//! level = "cinesync=debug,warn"
//! json = false
//! ```

use crate::error::{CinesyncError, Result};

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sync: SyncSettings,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// How often the player position is sampled.
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "cinesync=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 200,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            json: false,
        }
    }
}

impl SyncSettings {
    pub const MIN_POLL_MS: u64 = 100;
    pub const MAX_POLL_MS: u64 = 1000;

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(text).map_err(|e| CinesyncError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let ms = self.sync.poll_interval_ms;
        if !(SyncSettings::MIN_POLL_MS..=SyncSettings::MAX_POLL_MS).contains(&ms) {
            return Err(CinesyncError::Config(format!(
                "sync.poll_interval_ms must be between {} and {}, got {}",
                SyncSettings::MIN_POLL_MS,
                SyncSettings::MAX_POLL_MS,
                ms
            )));
        }
        if self.logging.level.trim().is_empty() {
            return Err(CinesyncError::Config("logging.level must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.sync.poll_interval(), Duration::from_millis(200));
    }

    #[test]
    fn partial_sections_fill_in() {
        let config = Config::from_toml("[sync]\npoll_interval_ms = 120\n").unwrap();
        assert_eq!(config.sync.poll_interval_ms, 120);
        assert_eq!(config.logging, LoggingConfig::default());

        let config = Config::from_toml("[logging]\njson = true\n").unwrap();
        assert!(config.logging.json);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn rejects_out_of_range_interval() {
        let err = Config::from_toml("[sync]\npoll_interval_ms = 5\n").unwrap_err();
        assert!(err.to_string().contains("poll_interval_ms"));
        assert!(Config::from_toml("[sync]\npoll_interval_ms = 5000\n").is_err());
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            Config::from_toml("[sync\n"),
            Err(CinesyncError::Config(_))
        ));
    }
}
