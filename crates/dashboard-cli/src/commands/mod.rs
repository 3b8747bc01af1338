//! CLI command implementations.

mod config;
mod keys;

pub use config::config_show;
pub use keys::{keys_generate, keys_list, keys_revoke, keys_watch};
