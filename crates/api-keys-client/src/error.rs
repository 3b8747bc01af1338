//! Error types for the API-keys client.

use thiserror::Error;

/// Errors returned by [`ApiKeysClient`](crate::ApiKeysClient).
#[derive(Debug, Error)]
pub enum ApiClientError {
    /// Network or transport-level HTTP error from reqwest.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("{message} (HTTP {status})")]
    Status {
        /// The HTTP status code returned by the server.
        status: u16,
        /// What the failed operation was.
        message: String,
    },

    /// The request did not complete within the configured timeout.
    #[error("API request timed out")]
    Timeout,

    /// JSON serialization or deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid base URL or other setup issue.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiClientError {
    /// HTTP status of a rejected request, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(error) => error.status().map(|status| status.as_u16()),
            _ => None,
        }
    }
}

/// Result type alias using ApiClientError.
pub type ApiClientResult<T> = Result<T, ApiClientError>;
