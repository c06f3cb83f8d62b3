use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    model::Coordinate,
    retry::{DEFAULT_DELAY_MS, DEFAULT_MAX_ATTEMPTS, RetryPolicy},
    scheduler::{DEFAULT_ADVICE_DELAY_MS, validate_interval},
};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Where the weather/advice server lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_BASE_URL.to_string(), timeout_secs: 10 }
    }
}

impl ServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per request, including the first.
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { max_attempts: DEFAULT_MAX_ATTEMPTS, delay_ms: DEFAULT_DELAY_MS }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.delay_ms))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub interval_secs: u64,
    /// Gap between the weather fetch and the advice request of one tick.
    pub advice_delay_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { interval_secs: 60, advice_delay_ms: DEFAULT_ADVICE_DELAY_MS }
    }
}

impl SchedulerConfig {
    pub fn advice_delay(&self) -> Duration {
        Duration::from_millis(self.advice_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub limit: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { limit: 10 }
    }
}

/// Optional fixed location, used when no coordinate is given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationConfig {
    pub latitude: f64,
    pub longitude: f64,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [server]
/// base_url = "http://127.0.0.1:5000"
///
/// [retry]
/// max_attempts = 5
/// delay_ms = 2000
///
/// [location]
/// latitude = 24.4798
/// longitude = 118.0894
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub retry: RetryConfig,
    pub scheduler: SchedulerConfig,
    pub history: HistoryConfig,
    pub location: Option<LocationConfig>,
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, use defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        cfg.validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-sync", "weather-sync")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.base_url.trim().is_empty() {
            bail!("server.base_url must not be empty");
        }
        if self.retry.max_attempts == 0 {
            bail!("retry.max_attempts must be at least 1");
        }
        if self.history.limit == 0 {
            bail!("history.limit must be at least 1");
        }
        validate_interval(self.scheduler.interval_secs)
            .context("scheduler.interval_secs is out of range")?;
        if let Some(loc) = self.location {
            Coordinate::new(loc.latitude, loc.longitude).context("location is out of range")?;
        }
        Ok(())
    }

    /// The configured default coordinate, if any.
    pub fn default_coordinate(&self) -> Option<Coordinate> {
        self.location
            .and_then(|loc| Coordinate::new(loc.latitude, loc.longitude).ok())
    }

    pub fn set_default_coordinate(&mut self, coordinate: Coordinate) {
        self.location = Some(LocationConfig {
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
        });
    }
}
