//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (DOSSIER_*)
//! 2. TOML config file (if DOSSIER_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! Command-line overrides are applied by the binary on top of the result.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// How pages are obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Headless browser; executes page scripts before extraction.
    #[default]
    Rendered,
    /// Plain HTTP GET of the document.
    Http,
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (DOSSIER_*)
/// 2. TOML config file (if DOSSIER_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite state database (checkpoint + dataset).
    ///
    /// Set via DOSSIER_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Batch to start from when no checkpoint has been persisted yet.
    ///
    /// Set via DOSSIER_CURRENT_BATCH environment variable.
    #[serde(default)]
    pub current_batch: u64,

    /// Number of URLs processed per run.
    ///
    /// Set via DOSSIER_URLS_PER_BATCH environment variable.
    #[serde(default = "default_urls_per_batch")]
    pub urls_per_batch: usize,

    /// Page navigation timeout in milliseconds.
    ///
    /// Set via DOSSIER_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Wait after page load for dynamic content, in milliseconds.
    ///
    /// Set via DOSSIER_SETTLE_MS environment variable.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Fixed delay between URLs, in milliseconds.
    ///
    /// Set via DOSSIER_REQUEST_DELAY_MS environment variable.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Offset used for the checkpoint's `nextRunAt`, in milliseconds.
    ///
    /// Set via DOSSIER_RESCHEDULE_DELAY_MS environment variable.
    #[serde(default = "default_reschedule_delay_ms")]
    pub reschedule_delay_ms: u64,

    /// Whether navigation waits for network activity to settle.
    ///
    /// Set via DOSSIER_WAIT_UNTIL_NETWORK_IDLE environment variable.
    #[serde(default = "default_true")]
    pub wait_until_network_idle: bool,

    /// User-Agent string for browser and HTTP requests.
    ///
    /// Set via DOSSIER_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Page acquisition mode: "rendered" or "http".
    ///
    /// Set via DOSSIER_FETCH_MODE environment variable.
    #[serde(default)]
    pub fetch_mode: FetchMode,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./dossier.sqlite")
}

fn default_urls_per_batch() -> usize {
    5
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_settle_ms() -> u64 {
    3_000
}

fn default_request_delay_ms() -> u64 {
    3_000
}

fn default_reschedule_delay_ms() -> u64 {
    60_000
}

fn default_true() -> bool {
    true
}

fn default_user_agent() -> String {
    concat!(
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 ",
        "(KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
    )
    .into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            current_batch: 0,
            urls_per_batch: default_urls_per_batch(),
            timeout_ms: default_timeout_ms(),
            settle_ms: default_settle_ms(),
            request_delay_ms: default_request_delay_ms(),
            reschedule_delay_ms: default_reschedule_delay_ms(),
            wait_until_network_idle: true,
            user_agent: default_user_agent(),
            fetch_mode: FetchMode::default(),
        }
    }
}

impl AppConfig {
    /// Navigation timeout as Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn reschedule_delay(&self) -> Duration {
        Duration::from_millis(self.reschedule_delay_ms)
    }

    /// Build the layered figment without extracting it.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `DOSSIER_`
    /// 2. TOML file from `DOSSIER_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("DOSSIER_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment.merge(
            Env::prefixed("DOSSIER_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        )
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    /// Extract and validate a configuration from an arbitrary figment.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
