//! Logging configuration and initialization
//!
//! Console output (compact or JSON) and optional file logging through a
//! non-blocking writer. `log` records are forwarded into the same subscriber.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Env var holding the log filter (e.g. "debug", "info,virtual_touch=trace")
pub const LOG_ENV: &str = "VIRTUAL_TOUCH_LOG";
/// Env var that switches console output to JSON when set to "json"
pub const LOG_FORMAT_ENV: &str = "VIRTUAL_TOUCH_LOG_FORMAT";

const DEFAULT_LOG_FILE: &str = "virtual-touch.log";

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Enable console output (default: true)
    pub console_enabled: bool,
    /// Also write logs to `file_path`
    pub file_enabled: bool,
    /// Log file (default: `virtual-touch.log` in the working directory)
    pub file_path: Option<PathBuf>,
    /// Use JSON format for console logs
    pub json_format: bool,
    /// Filter used when no env var is set
    pub default_level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            console_enabled: true,
            file_enabled: false,
            file_path: None,
            json_format: false,
            default_level: "info".to_string(),
        }
    }
}

/// Initialize the logging system with the given configuration
///
/// Returns a guard that must be kept alive for the duration of the program
/// so file logs get flushed.
///
/// Filter precedence: `VIRTUAL_TOUCH_LOG`, then `RUST_LOG`, then
/// `config.default_level`.
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_env("RUST_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(&config.default_level));
    let use_json = json_requested(config);

    // File layer: plain text, no colors, with source locations
    let (file_layer, file_guard, log_path) = if config.file_enabled {
        let log_path = config
            .file_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
        let file = std::fs::File::create(&log_path)?;
        let (writer, guard) = tracing_appender::non_blocking(file);
        let layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true);
        (Some(layer), Some(guard), Some(log_path))
    } else {
        (None, None, None)
    };

    let console_layer = (config.console_enabled && !use_json).then(|| fmt::layer().with_target(true).compact());
    let json_layer = (config.console_enabled && use_json).then(|| {
        fmt::layer()
            .json()
            .with_thread_names(true)
            .with_file(true)
            .with_line_number(true)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .with(json_layer)
        .try_init()?;

    if let Some(path) = &log_path {
        eprintln!("Logging to file: {}", path.display());
    }
    tracing::info!(
        target: "virtual_touch",
        version = env!("CARGO_PKG_VERSION"),
        json = use_json,
        file_enabled = log_path.is_some(),
        "logging ready"
    );

    Ok(file_guard)
}

/// JSON console output: env var wins over the config flag
fn json_requested(config: &LogConfig) -> bool {
    match std::env::var(LOG_FORMAT_ENV) {
        Ok(value) => value.eq_ignore_ascii_case("json"),
        Err(_) => config.json_format,
    }
}

// Re-export WorkerGuard so callers can store it
pub use tracing_appender::non_blocking::WorkerGuard as LogGuard;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_default() {
        let config = LogConfig::default();
        assert!(config.console_enabled);
        assert!(!config.file_enabled);
        assert!(!config.json_format);
        assert_eq!(config.default_level, "info");
    }

    #[test]
    fn test_log_config_partial_json() {
        let config: LogConfig = serde_json::from_str(r#"{"default_level": "debug"}"#).unwrap();
        assert_eq!(config.default_level, "debug");
        assert!(config.console_enabled);
    }
}
