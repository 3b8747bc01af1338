//! Shared API-key types for the Thumbdash dashboard.
//!
//! These are the records the dashboard knows about once the key listing
//! endpoint has answered. The full secret of a key only ever appears in a
//! [`GeneratedApiKey`], which the create endpoint returns exactly once.

mod mask;
mod types;

pub use mask::{mask_api_key, MASK_FILL, MASK_VISIBLE_CHARS};
pub use types::{
    ApiKeyId, ApiKeyRecord, ApiKeyStatus, ApiKeyTypeError, GeneratedApiKey, NewApiKey,
};
