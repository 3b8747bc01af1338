//! # Observability
//!
//! Logging setup shared by the Thumbdash binaries.
//!
//! Binaries call [`init_with_config`] once at startup and then use the
//! standard `tracing` macros. Library crates only ever use the macros.
//!
//! Every event is written as one JSON object per line to
//! `~/.thumbdash/logs/dev.jsonl` (or a configured path):
//!
//! - `tail -f ~/.thumbdash/logs/dev.jsonl | jq` for pretty JSON
//! - `lnav ~/.thumbdash/logs/dev.jsonl` for interactive exploration
//!
//! Field values that look like credentials (tokens, API keys, bearer
//! headers) are redacted before they are written.
//!
//! ## Usage
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "thumbdash".into(),
//!     default_level: "debug".into(),
//!     also_stderr: true,
//!     ..Default::default()
//! })?;
//! ```

mod json_layer;
mod redact;
mod writer;

use std::path::PathBuf;
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub use json_layer::{JsonLayer, LogEntry};
pub use writer::{CentralLogWriter, WriterFactory};

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Included in every log line for filtering.
    pub service_name: String,

    /// Default filter (e.g. "debug", "info,api_keys_client=trace").
    /// `RUST_LOG` takes precedence when set.
    pub default_level: String,

    /// Defaults to `~/.thumbdash/logs/dev.jsonl`.
    pub log_path: Option<PathBuf>,

    /// Also emit compact logs to stderr.
    pub also_stderr: bool,

    /// Filter for the stderr layer.
    pub stderr_level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
            stderr_level: "warn".into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ObservabilityError {
    #[error("Home directory not found; set an explicit log path")]
    NoHomeDir,

    #[error("Failed to open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Global logger already installed: {0}")]
    AlreadyInitialized(String),
}

/// `~/.thumbdash/logs/dev.jsonl`, when a home directory exists.
pub fn default_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".thumbdash").join("logs").join("dev.jsonl"))
}

/// Install the global subscriber. Returns the log file in use.
pub fn init_with_config(config: LogConfig) -> Result<PathBuf, ObservabilityError> {
    let log_path = match config.log_path.clone() {
        Some(path) => path,
        None => default_log_path().ok_or(ObservabilityError::NoHomeDir)?,
    };

    let writer = CentralLogWriter::new(&log_path).map_err(|source| ObservabilityError::LogFile {
        path: log_path.clone(),
        source,
    })?;

    let json_layer = JsonLayer::new(config.service_name.clone(), WriterFactory::new(writer))
        .with_filter(env_filter_or(&config.default_level));

    let stderr_layer = config.also_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_filter(env_filter_or(&config.stderr_level))
    });

    tracing_subscriber::registry()
        .with(json_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| ObservabilityError::AlreadyInitialized(e.to_string()))?;

    tracing::info!(
        service = %config.service_name,
        log_path = %log_path.display(),
        "observability initialized"
    );
    Ok(log_path)
}

fn env_filter_or(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Re-export tracing macros for convenience.
pub use tracing::{debug, error, info, instrument, trace, warn};
