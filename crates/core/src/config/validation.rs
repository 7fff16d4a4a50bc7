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
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `max_bytes` is 0 or exceeds 50MB
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `max_concurrency` is 0 or exceeds 64
    /// - `user_agent` is empty
    /// - `error_window_secs` or `scheduler_period_secs` is 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        const MAX_BYTES_LIMIT: usize = 50 * 1024 * 1024;

        match self.max_bytes {
            0 => return Err(invalid("max_bytes", "must be greater than 0")),
            n if n > MAX_BYTES_LIMIT => return Err(invalid("max_bytes", "must not exceed 50MB")),
            _ => {}
        }
        if !(100..=300_000).contains(&self.timeout_ms) {
            return Err(invalid("timeout_ms", "must be between 100ms and 5 minutes (300000ms)"));
        }
        if !(1..=64).contains(&self.max_concurrency) {
            return Err(invalid("max_concurrency", "must be between 1 and 64"));
        }
        if self.user_agent.trim().is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }
        if self.error_window_secs == 0 {
            return Err(invalid("error_window_secs", "must be greater than 0"));
        }
        if self.scheduler_period_secs == 0 {
            return Err(invalid("scheduler_period_secs", "must be greater than 0"));
        }

        if self.retention_window_secs < self.error_window_secs {
            tracing::warn!(
                retention_window_secs = self.retention_window_secs,
                error_window_secs = self.error_window_secs,
                "retention window is shorter than the error window"
            );
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.to_string(), reason: reason.to_string() }
}
