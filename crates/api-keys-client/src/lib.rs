//! HTTP client for the dashboard's API-key endpoints.
//!
//! Lists, generates and revokes keys, and serves as the remote source for
//! [`api_key_sync_coordinator::SyncCoordinator`].

mod client;
mod error;

pub use client::{ApiClientConfig, ApiKeysClient, DEFAULT_REQUEST_TIMEOUT};
pub use error::{ApiClientError, ApiClientResult};
