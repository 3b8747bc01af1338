//! Configuration commands.

use crate::output::{self, OutputFormat};
use anyhow::Result;
use dashboard_config_and_utils::{Config, Paths};
use serde::Serialize;

#[derive(Serialize)]
struct ConfigView<'a> {
    config_file: String,
    log_file: String,
    log_level: &'a str,
    api_base_url: &'a str,
    request_timeout_ms: u64,
    environment: &'static str,
    dev_api_key: Option<String>,
    dev_api_key_active: bool,
    coalesce_syncs: bool,
}

/// Print the effective configuration with the development key masked.
pub fn config_show(config: &Config, paths: &Paths, format: &OutputFormat) -> Result<()> {
    let view = ConfigView {
        config_file: paths.config_file().display().to_string(),
        log_file: paths.log_file().display().to_string(),
        log_level: &config.log_level,
        api_base_url: &config.api_base_url,
        request_timeout_ms: config.request_timeout_ms,
        environment: config.environment.as_str(),
        dev_api_key: config.masked_dev_api_key(),
        dev_api_key_active: config.effective_dev_api_key().is_some(),
        coalesce_syncs: config.coalesce_syncs,
    };

    match format {
        OutputFormat::Text => {
            output::print_heading("Configuration");
            output::print_row("Config file", &view.config_file);
            output::print_row("Log file", &view.log_file);
            output::print_row("Log level", view.log_level);
            output::print_row("API base URL", view.api_base_url);
            output::print_row("Request timeout", &format!("{} ms", view.request_timeout_ms));
            output::print_row("Environment", view.environment);
            let dev_key = match (&view.dev_api_key, view.dev_api_key_active) {
                (Some(masked), true) => masked.clone(),
                (Some(masked), false) => format!("{masked} (ignored outside development)"),
                (None, _) => "Not set".to_string(),
            };
            output::print_row("Dev API key", &dev_key);
            let policy = if view.coalesce_syncs {
                "coalesce"
            } else {
                "per-request"
            };
            output::print_row("Sync policy", policy);
        }
        OutputFormat::Json => output::print_json(&view)?,
    }
    Ok(())
}
