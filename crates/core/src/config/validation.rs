//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `urls_per_batch` is 0
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `settle_ms` or `request_delay_ms` exceeds one minute
    /// - `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.urls_per_batch == 0 {
            return Err(ConfigError::Invalid {
                field: "urls_per_batch".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.settle_ms > 60_000 {
            return Err(ConfigError::Invalid { field: "settle_ms".into(), reason: "must not exceed 60000ms".into() });
        }
        if self.request_delay_ms > 60_000 {
            return Err(ConfigError::Invalid {
                field: "request_delay_ms".into(),
                reason: "must not exceed 60000ms".into(),
            });
        }

        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.request_delay_ms == 0 {
            tracing::warn!("request_delay_ms is 0; requests will be issued back to back");
        }

        Ok(())
    }
}
