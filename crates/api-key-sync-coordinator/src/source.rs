//! The remote key source capability.

use crate::error::BoxedSourceError;
use api_key_types::ApiKeyRecord;
use async_trait::async_trait;

/// Authoritative list of the caller's API keys.
///
/// Awaiting `fetch_keys` is the only point where a sync cycle yields. Any
/// timeout policy belongs to the implementation.
#[async_trait]
pub trait RemoteKeySource: Send + Sync {
    /// Fetches the full, current key list, in server order.
    async fn fetch_keys(&self, token: Option<&str>) -> Result<Vec<ApiKeyRecord>, BoxedSourceError>;
}
