//! Core API-key types.

use crate::mask::mask_api_key;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building API-key values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiKeyTypeError {
    /// A key name was empty after trimming.
    #[error("API key name must not be empty")]
    EmptyName,
}

/// Opaque server-assigned identifier of an API key.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKeyId(pub String);

impl ApiKeyId {
    /// Creates a key ID from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the key ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ApiKeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ApiKeyId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ApiKeyId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Client-visible lifecycle status of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiKeyStatus {
    Active,
    Expired,
    Revoked,
}

impl ApiKeyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiKeyStatus::Active => "active",
            ApiKeyStatus::Expired => "expired",
            ApiKeyStatus::Revoked => "revoked",
        }
    }
}

impl std::fmt::Display for ApiKeyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One issued credential as returned by the key listing endpoint.
///
/// `identifier` is already masked by the server; the full secret never
/// appears in a listed record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyRecord {
    pub id: ApiKeyId,
    pub name: String,
    pub identifier: String,
    pub created_at: DateTime<Utc>,
    /// `None` means the key never expires.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// `None` means the key was never used.
    #[serde(default)]
    pub last_used_at: Option<DateTime<Utc>>,
    /// `false` once the key has been revoked.
    pub enabled: bool,
}

impl ApiKeyRecord {
    /// Status of the key at `now`. Revocation takes precedence over expiry.
    pub fn status(&self, now: DateTime<Utc>) -> ApiKeyStatus {
        if !self.enabled {
            return ApiKeyStatus::Revoked;
        }
        match self.expires_at {
            Some(expires_at) if expires_at <= now => ApiKeyStatus::Expired,
            _ => ApiKeyStatus::Active,
        }
    }

    /// Whether the key can still authenticate requests at `now`.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.status(now) == ApiKeyStatus::Active
    }
}

/// Request body for generating a new key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewApiKey {
    name: String,
}

impl NewApiKey {
    /// Builds a request from a user-supplied name, trimming surrounding
    /// whitespace.
    pub fn new(name: &str) -> Result<Self, ApiKeyTypeError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ApiKeyTypeError::EmptyName);
        }
        Ok(Self {
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Response of the create endpoint. Carries the full secret, which is shown
/// to the user once and never stored locally.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedApiKey {
    pub id: ApiKeyId,
    pub name: String,
    pub key: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl GeneratedApiKey {
    /// The secret in its display-safe form.
    pub fn masked_key(&self) -> String {
        mask_api_key(&self.key)
    }
}

impl std::fmt::Debug for GeneratedApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedApiKey")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("key", &self.masked_key())
            .field("created_at", &self.created_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
