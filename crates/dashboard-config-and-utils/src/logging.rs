//! Logging initialization for the dashboard tools.
//!
//! Structured JSONL goes to `~/.thumbdash/logs/dev.jsonl` through the
//! observability package; `RUST_LOG` overrides the configured level.

use crate::{CoreResult, Paths};
use std::path::PathBuf;

const SERVICE_NAME: &str = "thumbdash";

/// Initialize logging for a command-line invocation.
///
/// `verbose` mirrors events at `level` to stderr; otherwise only warnings
/// and errors reach the terminal.
///
/// # Example
///
/// ```ignore
/// init_logging(&paths, &config.log_level, false)?;
/// tracing::info!("Listing API keys");
/// ```
pub fn init_logging(paths: &Paths, level: &str, verbose: bool) -> CoreResult<PathBuf> {
    paths.ensure_dirs()?;

    let log_path = observability::init_with_config(observability::LogConfig {
        service_name: SERVICE_NAME.into(),
        default_level: level.into(),
        log_path: Some(paths.log_file()),
        also_stderr: true,
        stderr_level: if verbose { level.into() } else { "warn".into() },
    })?;

    tracing::debug!(log_path = %log_path.display(), "Logging initialized");
    Ok(log_path)
}
