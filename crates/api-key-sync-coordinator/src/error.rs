//! Sync coordinator error types.

use api_key_collection::StoreError;
use std::sync::Arc;
use thiserror::Error;

/// Error produced by a [`RemoteKeySource`](crate::RemoteKeySource).
pub type BoxedSourceError = Box<dyn std::error::Error + Send + Sync>;

/// Failure of one sync cycle.
///
/// `Clone` so that a coalesced cycle can hand the same failure to every
/// caller attached to it.
#[derive(Debug, Clone, Error)]
pub enum KeySyncError {
    /// The remote key list could not be fetched. The source's error is kept
    /// as-is.
    #[error("Remote fetch failed: {0}")]
    Fetch(Arc<dyn std::error::Error + Send + Sync>),

    /// The local collection rejected the replace.
    #[error("Local store error: {0}")]
    Store(#[from] StoreError),

    /// The coordinator's worker is no longer running.
    #[error("Sync coordinator stopped")]
    Stopped,
}

impl KeySyncError {
    pub(crate) fn fetch(error: BoxedSourceError) -> Self {
        Self::Fetch(Arc::from(error))
    }

    /// The remote source's error, for callers that want to downcast it.
    pub fn fetch_source(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Fetch(error) => Some(error.as_ref()),
            _ => None,
        }
    }
}

/// Result type alias using KeySyncError.
pub type KeySyncResult<T> = Result<T, KeySyncError>;

#[cfg(test)]
mod tests {
    use super::*;
    use api_key_types::ApiKeyId;

    #[derive(Debug, Error)]
    #[error("upstream said no")]
    struct Upstream;

    #[test]
    fn fetch_error_keeps_source() {
        let err = KeySyncError::fetch(Box::new(Upstream));
        assert_eq!(err.to_string(), "Remote fetch failed: upstream said no");

        let source = err.fetch_source().unwrap();
        assert!(source.downcast_ref::<Upstream>().is_some());
    }

    #[test]
    fn store_error_converts() {
        let err: KeySyncError = StoreError::DuplicateKey(ApiKeyId::from_string("a")).into();
        assert_eq!(err.to_string(), "Local store error: Duplicate API key id: a");
        assert!(err.fetch_source().is_none());
    }

    #[test]
    fn clones_share_the_source() {
        let err = KeySyncError::fetch(Box::new(Upstream));
        let cloned = err.clone();
        match (&err, &cloned) {
            (KeySyncError::Fetch(a), KeySyncError::Fetch(b)) => assert!(Arc::ptr_eq(a, b)),
            _ => panic!("expected fetch errors"),
        }
    }
}
