//! Log file setup. The terminal belongs to the UI, so events go to a file.

use crate::config::ConsoleConfig;
use std::fs::{File, OpenOptions};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding an `EnvFilter` directive.
pub const LOG_ENV: &str = "CAMPUS_LOG";

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to open log file: {0}")]
    Open(#[from] std::io::Error),
    #[error("Invalid log directive: {0}")]
    Directive(#[from] tracing_subscriber::filter::ParseError),
    #[error("Failed to install subscriber: {0}")]
    Install(String),
}

/// Install the global subscriber writing to `config.log_path`.
pub fn init(config: &ConsoleConfig) -> Result<(), LoggingError> {
    let file = open_log_file(config)?;
    let env_filter = build_filter(std::env::var(LOG_ENV).ok().as_deref(), &config.log_level)?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .map_err(|e| LoggingError::Install(e.to_string()))?;

    tracing::info!(
        log_path = %config.log_path.display(),
        api_base_url = %config.api_base_url,
        "console logging initialized"
    );
    Ok(())
}

/// The `CAMPUS_LOG` directive wins over the configured level.
pub fn build_filter(env_directive: Option<&str>, level: &str) -> Result<EnvFilter, LoggingError> {
    let directive = env_directive
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(level);
    Ok(EnvFilter::try_new(directive)?)
}

fn open_log_file(config: &ConsoleConfig) -> Result<File, LoggingError> {
    if let Some(parent) = config.log_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_directive_overrides_level() {
        let filter = build_filter(Some("campus_core=trace"), "info").unwrap();
        assert_eq!(filter.to_string(), "campus_core=trace");
    }

    #[test]
    fn test_blank_env_directive_falls_back() {
        let filter = build_filter(Some("  "), "warn").unwrap();
        assert_eq!(filter.to_string(), "warn");
    }
}
