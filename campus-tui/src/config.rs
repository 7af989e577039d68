//! Configuration loading for the campus console.
//!
//! Connection, auth and logging fields are required. List tuning fields
//! (debounce, margin, threshold, labels) fall back to the documented defaults.

use campus_core::Collection;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsoleConfig {
    pub api_base_url: String,
    pub auth: AuthConfig,
    pub request_timeout_ms: u64,
    pub refresh_interval_ms: u64,
    pub log_path: PathBuf,
    pub log_level: String,
    pub cache_ttl_ms: u64,
    #[serde(default)]
    pub retry: RetryConfig,
    pub lists: ListsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    pub api_key: Option<String>,
    pub jwt: Option<String>,
}

/// Transport-level retries for network failures.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    pub attempts: u32,
    pub initial_ms: u64,
    pub max_ms: u64,
    pub multiplier: f64,
    pub jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 2,
            initial_ms: 200,
            max_ms: 2_000,
            multiplier: 2.0,
            jitter_ms: 50,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListsConfig {
    pub students: ListConfig,
    pub payments: ListConfig,
}

impl ListsConfig {
    pub fn for_collection(&self, collection: Collection) -> &ListConfig {
        match collection {
            Collection::Students => &self.students,
            Collection::Payments => &self.payments,
        }
    }
}

/// Per-list tuning and display strings. No protocol impact.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListConfig {
    pub page_size: u32,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default)]
    pub margin_rows: u16,
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    #[serde(default = "default_infinite_scroll")]
    pub infinite_scroll: bool,
    #[serde(default)]
    pub labels: Labels,
}

impl ListConfig {
    pub fn with_page_size(page_size: u32) -> Self {
        Self {
            page_size,
            debounce_ms: default_debounce_ms(),
            margin_rows: 0,
            threshold: default_threshold(),
            infinite_scroll: default_infinite_scroll(),
            labels: Labels::default(),
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Labels {
    pub loading: String,
    pub fetching_more: String,
    pub error: String,
    pub exhausted: String,
    pub empty: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            loading: "Loading...".to_string(),
            fetching_more: "Loading more...".to_string(),
            error: "Could not load data".to_string(),
            exhausted: "No more records".to_string(),
            empty: "Nothing to show".to_string(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    100
}

fn default_threshold() -> f32 {
    0.1
}

fn default_infinite_scroll() -> bool {
    true
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or CAMPUS_CONSOLE_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ConsoleConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_args().or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        let config = Self::from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(invalid("api_base_url", "must not be empty"));
        }
        if self.auth.api_key.is_none() && self.auth.jwt.is_none() {
            return Err(invalid("auth", "api_key or jwt must be provided"));
        }
        if self.request_timeout_ms == 0 {
            return Err(invalid("request_timeout_ms", "must be > 0"));
        }
        if self.refresh_interval_ms == 0 {
            return Err(invalid("refresh_interval_ms", "must be > 0"));
        }
        if self.cache_ttl_ms == 0 {
            return Err(invalid("cache_ttl_ms", "must be > 0"));
        }
        if self.log_path.as_os_str().is_empty() {
            return Err(invalid("log_path", "must not be empty"));
        }
        if self.log_level.trim().is_empty() {
            return Err(invalid("log_level", "must not be empty"));
        }
        if self.retry.initial_ms == 0 {
            return Err(invalid("retry.initial_ms", "must be > 0"));
        }
        if self.retry.max_ms < self.retry.initial_ms {
            return Err(invalid("retry.max_ms", "must be >= initial_ms"));
        }
        if self.retry.multiplier < 1.0 {
            return Err(invalid("retry.multiplier", "must be >= 1.0"));
        }
        validate_list("lists.students", &self.lists.students)?;
        validate_list("lists.payments", &self.lists.payments)?;
        Ok(())
    }
}

fn validate_list(field: &'static str, list: &ListConfig) -> Result<(), ConfigError> {
    if list.page_size == 0 {
        return Err(ConfigError::InvalidValue {
            field,
            reason: "page_size must be > 0".to_string(),
        });
    }
    if !(list.threshold > 0.0 && list.threshold <= 1.0) {
        return Err(ConfigError::InvalidValue {
            field,
            reason: "threshold must be in (0, 1]".to_string(),
        });
    }
    Ok(())
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var("CAMPUS_CONSOLE_CONFIG").ok().map(PathBuf::from)
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}
