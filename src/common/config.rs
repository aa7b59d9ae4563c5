//! Configuration file handling

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct Config {
    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,

    /// Trigger polling settings
    #[serde(default)]
    pub polling: PollingConfig,

    /// Where to look for tour definitions
    #[serde(default)]
    pub tours: ToursConfig,

    /// Translation settings
    #[serde(default)]
    pub i18n: I18nConfig,
}

/// Timeout settings in milliseconds
#[derive(Debug, Deserialize, Serialize)]
pub struct Timeouts {
    /// How long a step waits for its trigger element
    #[serde(default = "default_step_timeout")]
    pub step_timeout_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            step_timeout_ms: default_step_timeout(),
        }
    }
}

fn default_step_timeout() -> u64 {
    10_000
}

/// Backoff used while a trigger element has not appeared yet
#[derive(Debug, Deserialize, Serialize)]
pub struct PollingConfig {
    /// Delay before the second lookup
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Upper bound on the delay between lookups
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,

    /// Growth factor applied after every miss
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Pause after each applied action so the surface can re-render
    #[serde(default)]
    pub settle_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
            multiplier: default_multiplier(),
            settle_ms: 0,
        }
    }
}

fn default_initial_backoff() -> u64 {
    50
}
fn default_max_backoff() -> u64 {
    1_000
}
fn default_multiplier() -> f64 {
    2.0
}

/// Tour discovery settings
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct ToursConfig {
    /// Extra directories containing `*.yaml` tour definitions
    #[serde(default)]
    pub dirs: Vec<PathBuf>,
}

/// Translation settings
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct I18nConfig {
    /// YAML file mapping description keys to display text
    pub catalog: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| super::Error::file_read(path, e))?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Render the configuration back to TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| super::Error::Config(e.to_string()))
    }

    fn validate(&self) -> Result<()> {
        let multiplier = self.polling.multiplier;
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(super::Error::ConfigParse(format!(
                "polling.multiplier must be a finite number of at least 1.0, got {multiplier}"
            )));
        }
        if self.polling.initial_backoff_ms == 0 {
            return Err(super::Error::ConfigParse(
                "polling.initial_backoff_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Default per-step trigger timeout
    pub fn step_timeout(&self) -> Duration {
        Duration::from_millis(self.timeouts.step_timeout_ms)
    }
}
