//! Configuration management for the dashboard tools.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default API root (can be overridden at compile time via THUMBDASH_API_URL env var).
pub const DEFAULT_API_BASE_URL: &str = match option_env!("THUMBDASH_API_URL") {
    Some(url) => url,
    None => "https://app.thumbdash.dev/api",
};

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Bound on the key listing request.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 2_000;

/// Deployment mode. Development enables the `x-api-key` test header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Environment {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(CoreError::Config(format!("Unknown environment: {other}"))),
        }
    }
}

/// Dashboard tool configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log filter (trace, debug, info, warn, error, or a directive list).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// API root the key endpoints live under.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Timeout for the key listing request, in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub environment: Environment,
    /// Test key sent as `x-api-key`. Ignored outside development.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_api_key: Option<String>,
    /// Let queued refreshes share one cycle instead of one cycle each.
    #[serde(default)]
    pub coalesce_syncs: bool,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            api_base_url: default_api_base_url(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            environment: Environment::default(),
            dev_api_key: None,
            coalesce_syncs: false,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("log_level", &self.log_level)
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("environment", &self.environment)
            .field("dev_api_key", &self.masked_dev_api_key())
            .field("coalesce_syncs", &self.coalesce_syncs)
            .finish()
    }
}

impl Config {
    /// Load configuration from the config file (if any), then apply
    /// environment overrides.
    ///
    /// The result is not validated yet: apply command-line overrides first,
    /// then call [`Config::validate`]. The second value lists environment
    /// overrides that were set but ignored.
    pub fn load(paths: &Paths) -> CoreResult<(Self, Vec<String>)> {
        Self::load_with_env(paths, |name| std::env::var(name).ok())
    }

    /// Like [`Config::load`], reading overrides through `lookup`.
    pub fn load_with_env(
        paths: &Paths,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> CoreResult<(Self, Vec<String>)> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        let ignored = config.apply_env(lookup);
        Ok((config, ignored))
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Apply overrides from `lookup` (THUMBDASH_LOG_LEVEL, THUMBDASH_API_URL,
    /// THUMBDASH_ENV, TEST_API_KEY). Empty values are skipped silently;
    /// values that cannot be used are skipped and described in the result.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Vec<String> {
        let var = |name: &str| lookup(name).and_then(non_empty);
        let mut ignored = Vec::new();

        if let Some(log_level) = var("THUMBDASH_LOG_LEVEL") {
            self.log_level = log_level;
        }
        if let Some(api_url) = var("THUMBDASH_API_URL") {
            self.api_base_url = api_url;
        }
        if let Some(environment) = var("THUMBDASH_ENV") {
            match environment.parse() {
                Ok(environment) => self.environment = environment,
                Err(error) => ignored.push(format!("Ignoring THUMBDASH_ENV: {error}")),
            }
        }
        if let Some(dev_key) = var("TEST_API_KEY") {
            self.dev_api_key = Some(dev_key);
        }
        ignored
    }

    /// Reject values that cannot work.
    pub fn validate(&self) -> CoreResult<()> {
        self.api_base_url()?;
        if self.request_timeout_ms == 0 {
            return Err(CoreError::Config(
                "request_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the API root as a parsed URL.
    pub fn api_base_url(&self) -> CoreResult<Url> {
        Url::parse(&self.api_base_url).map_err(CoreError::from)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// The development key, only when running in development mode.
    pub fn effective_dev_api_key(&self) -> Option<&str> {
        match self.environment {
            Environment::Development => self.dev_api_key.as_deref(),
            Environment::Production => None,
        }
    }

    /// The configured development key in display-safe form.
    pub fn masked_dev_api_key(&self) -> Option<String> {
        self.dev_api_key.as_deref().map(api_key_types::mask_api_key)
    }
}

fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
