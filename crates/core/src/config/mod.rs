//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (FUNNIES_*)
//! 2. TOML config file (if FUNNIES_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::freshness::FreshnessPolicy;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (FUNNIES_*)
/// 2. TOML config file (if FUNNIES_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to SQLite cache database.
    ///
    /// Set via FUNNIES_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via FUNNIES_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Deadline for each individual network call, in milliseconds.
    ///
    /// Set via FUNNIES_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via FUNNIES_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Number of sources fetched concurrently during a pass.
    ///
    /// Set via FUNNIES_MAX_CONCURRENCY environment variable.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Base freshness interval for interactive requests, in seconds.
    #[serde(default = "default_on_demand_interval_secs")]
    pub on_demand_interval_secs: u64,

    /// Jitter window added to the interactive interval, in seconds.
    #[serde(default)]
    pub on_demand_jitter_secs: u64,

    /// Base freshness interval for the background pass, in seconds.
    #[serde(default = "default_scheduled_interval_secs")]
    pub scheduled_interval_secs: u64,

    /// Jitter window added to the background interval, in seconds.
    #[serde(default = "default_scheduled_jitter_secs")]
    pub scheduled_jitter_secs: u64,

    /// How long an erroring entry counts as fresh, in seconds.
    #[serde(default = "default_error_window_secs")]
    pub error_window_secs: u64,

    /// Age below which a good entry survives a failing refetch, in seconds.
    #[serde(default = "default_retention_window_secs")]
    pub retention_window_secs: u64,

    /// Whether the background sync loop runs.
    ///
    /// Set via FUNNIES_SCHEDULER_ENABLED environment variable.
    #[serde(default = "default_true")]
    pub scheduler_enabled: bool,

    /// Tick period of the background sync loop, in seconds.
    #[serde(default = "default_scheduler_period_secs")]
    pub scheduler_period_secs: u64,

    /// Catalog sources to leave out.
    ///
    /// Set via FUNNIES_DISABLED_SOURCES environment variable.
    #[serde(default)]
    pub disabled_sources: Vec<String>,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./funnies-cache.sqlite")
}

fn default_user_agent() -> String {
    "funnies/0.1".into()
}

fn default_timeout_ms() -> u64 {
    2_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_max_concurrency() -> usize {
    8
}

fn default_on_demand_interval_secs() -> u64 {
    12 * 60 * 60
}

fn default_scheduled_interval_secs() -> u64 {
    6 * 60 * 60
}

fn default_scheduled_jitter_secs() -> u64 {
    30 * 60
}

fn default_error_window_secs() -> u64 {
    60 * 60
}

fn default_retention_window_secs() -> u64 {
    24 * 60 * 60
}

fn default_scheduler_period_secs() -> u64 {
    30 * 60
}

fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            max_concurrency: default_max_concurrency(),
            on_demand_interval_secs: default_on_demand_interval_secs(),
            on_demand_jitter_secs: 0,
            scheduled_interval_secs: default_scheduled_interval_secs(),
            scheduled_jitter_secs: default_scheduled_jitter_secs(),
            error_window_secs: default_error_window_secs(),
            retention_window_secs: default_retention_window_secs(),
            scheduler_enabled: true,
            scheduler_period_secs: default_scheduler_period_secs(),
            disabled_sources: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Background loop period.
    pub fn scheduler_period(&self) -> Duration {
        Duration::from_secs(self.scheduler_period_secs)
    }

    /// Error-retention threshold.
    pub fn retention_window(&self) -> Duration {
        Duration::from_secs(self.retention_window_secs)
    }

    /// Policy for interactive list/get requests.
    pub fn on_demand_policy(&self) -> FreshnessPolicy {
        FreshnessPolicy::new(
            Duration::from_secs(self.on_demand_interval_secs),
            Duration::from_secs(self.on_demand_jitter_secs),
        )
        .with_error_window(Duration::from_secs(self.error_window_secs))
    }

    /// Policy for the background pass.
    pub fn scheduled_policy(&self) -> FreshnessPolicy {
        FreshnessPolicy::new(
            Duration::from_secs(self.scheduled_interval_secs),
            Duration::from_secs(self.scheduled_jitter_secs),
        )
        .with_error_window(Duration::from_secs(self.error_window_secs))
    }

    /// Whether a catalog source is switched off.
    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled_sources.iter().any(|d| d == name)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `FUNNIES_`
    /// 2. TOML file from `FUNNIES_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("FUNNIES_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("FUNNIES_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
