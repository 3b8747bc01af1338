//! Local store error types.

use api_key_types::ApiKeyId;
use thiserror::Error;

/// Errors raised by a [`KeyCollection`](crate::KeyCollection).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// An insert targeted an id that is already present.
    #[error("Duplicate API key id: {0}")]
    DuplicateKey(ApiKeyId),
}

/// Result type alias using StoreError.
pub type StoreResult<T> = Result<T, StoreError>;
