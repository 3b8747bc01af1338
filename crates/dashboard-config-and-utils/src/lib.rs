//! Core configuration and utilities for the Thumbdash dashboard tools.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, Environment, DEFAULT_API_BASE_URL, DEFAULT_LOG_LEVEL, DEFAULT_REQUEST_TIMEOUT_MS,
};
pub use error::{CoreError, CoreResult};
pub use logging::init_logging;
pub use paths::Paths;
