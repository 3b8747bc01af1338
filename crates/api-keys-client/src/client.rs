//! REST client for the `/api-key` endpoints.

use crate::error::{ApiClientError, ApiClientResult};
use api_key_sync_coordinator::{BoxedSourceError, RemoteKeySource};
use api_key_types::{ApiKeyId, ApiKeyRecord, GeneratedApiKey, NewApiKey};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Bound on the key listing request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

const DEV_API_KEY_HEADER: &str = "x-api-key";

/// Settings for [`ApiKeysClient`].
#[derive(Clone)]
pub struct ApiClientConfig {
    /// API root, e.g. `https://app.thumbdash.dev/api`.
    pub base_url: String,
    /// Applies to `list_api_keys`.
    pub request_timeout: Duration,
    /// Sent as `x-api-key` on every request. Only set in development.
    pub dev_api_key: Option<String>,
}

impl ApiClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            dev_api_key: None,
        }
    }
}

impl std::fmt::Debug for ApiClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClientConfig")
            .field("base_url", &self.base_url)
            .field("request_timeout", &self.request_timeout)
            .field(
                "dev_api_key",
                &self.dev_api_key.as_deref().map(api_key_types::mask_api_key),
            )
            .finish()
    }
}

/// Client for listing, generating and revoking API keys.
#[derive(Clone, Debug)]
pub struct ApiKeysClient {
    http_client: reqwest::Client,
    base_url: Url,
    request_timeout: Duration,
}

impl ApiKeysClient {
    /// Create a client for the API rooted at `config.base_url`.
    ///
    /// # Errors
    /// Returns `ApiClientError::Config` if the base URL cannot be parsed or
    /// the development key is not a valid header value.
    pub fn new(config: ApiClientConfig) -> ApiClientResult<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ApiClientError::Config(format!("Invalid API base URL {}: {e}", config.base_url))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ApiClientError::Config(format!(
                "API base URL cannot carry paths: {}",
                config.base_url
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(dev_key) = config.dev_api_key.as_deref() {
            let mut value = HeaderValue::from_str(dev_key).map_err(|_| {
                ApiClientError::Config(
                    "Development API key is not a valid header value".to_string(),
                )
            })?;
            value.set_sensitive(true);
            headers.insert(DEV_API_KEY_HEADER, value);
            debug!("Development API key header enabled");
        }

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http_client,
            base_url,
            request_timeout: config.request_timeout,
        })
    }

    /// Build the URL for `{base}/{segments...}`. Segments are percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> ApiClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ApiClientError::Config(format!(
                    "API base URL cannot carry paths: {}",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(
        &self,
        method: reqwest::Method,
        url: Url,
        token: Option<&str>,
    ) -> reqwest::RequestBuilder {
        let builder = self.http_client.request(method, url);
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Fetch every key owned by the caller, in server order.
    ///
    /// Bounded by the configured request timeout.
    pub async fn list_api_keys(&self, token: Option<&str>) -> ApiClientResult<Vec<ApiKeyRecord>> {
        let url = self.endpoint(&["api-key"])?;
        debug!(url = %url, "Fetching API keys");

        let response = self
            .request(reqwest::Method::GET, url, token)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(map_send_error)?;

        let response = check_status(response, "Failed to fetch API keys").await?;
        let records: Vec<ApiKeyRecord> = decode(response).await?;

        debug!(count = records.len(), "Fetched API keys");
        Ok(records)
    }

    /// Generate a new key. The returned secret is only available here.
    pub async fn create_api_key(
        &self,
        new_key: &NewApiKey,
        token: Option<&str>,
    ) -> ApiClientResult<GeneratedApiKey> {
        let url = self.endpoint(&["api-key", "generate"])?;
        debug!(name = new_key.name(), "Generating API key");

        let response = self
            .request(reqwest::Method::POST, url, token)
            .body(serde_json::to_vec(new_key)?)
            .send()
            .await
            .map_err(map_send_error)?;

        let response = check_status(response, "Failed to create API key").await?;
        let generated: GeneratedApiKey = decode(response).await?;

        info!(key_id = %generated.id, name = %generated.name, "API key generated");
        Ok(generated)
    }

    /// Revoke a key. The response body is ignored.
    pub async fn revoke_api_key(&self, id: &ApiKeyId, token: Option<&str>) -> ApiClientResult<()> {
        let url = self.endpoint(&["api-key", id.as_str()])?;
        debug!(key_id = %id, "Revoking API key");

        let response = self
            .request(reqwest::Method::DELETE, url, token)
            .send()
            .await
            .map_err(map_send_error)?;

        check_status(response, "Failed to revoke API key").await?;

        info!(key_id = %id, "API key revoked");
        Ok(())
    }
}

#[async_trait]
impl RemoteKeySource for ApiKeysClient {
    async fn fetch_keys(&self, token: Option<&str>) -> Result<Vec<ApiKeyRecord>, BoxedSourceError> {
        Ok(self.list_api_keys(token).await?)
    }
}

fn map_send_error(error: reqwest::Error) -> ApiClientError {
    if error.is_timeout() {
        ApiClientError::Timeout
    } else {
        ApiClientError::Http(error)
    }
}

async fn check_status(
    response: reqwest::Response,
    message: &str,
) -> ApiClientResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body_len = response.text().await.map(|body| body.len()).unwrap_or_default();
    warn!(status = status.as_u16(), body_len, "{message}");
    Err(ApiClientError::Status {
        status: status.as_u16(),
        message: message.to_string(),
    })
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ApiClientResult<T> {
    let body = response.bytes().await.map_err(map_send_error)?;
    Ok(serde_json::from_slice(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn listed_key(id: &str, name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "identifier": "ptk_test_****1234",
            "createdAt": "2024-03-01T12:00:00Z",
            "expiresAt": null,
            "lastUsedAt": "2024-03-02T08:30:00Z",
            "enabled": true
        })
    }

    fn client_for(server: &MockServer) -> ApiKeysClient {
        ApiKeysClient::new(ApiClientConfig::new(format!("{}/api", server.uri()))).unwrap()
    }

    #[tokio::test]
    async fn test_list_api_keys() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/api-key"))
            .and(header("authorization", "Bearer session-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                listed_key("existing-key-1", "Existing Key"),
                listed_key("test-key-123", "Test Key"),
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let keys = client_for(&server)
            .list_api_keys(Some("session-token"))
            .await
            .unwrap();

        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0].id.as_str(), "existing-key-1");
        assert_eq!(keys[1].name, "Test Key");
        assert!(keys[0].expires_at.is_none());
        assert!(keys[0].last_used_at.is_some());
    }

    #[tokio::test]
    async fn test_list_failure_uses_operation_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/api-key"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = client_for(&server).list_api_keys(None).await.unwrap_err();

        assert!(matches!(err, ApiClientError::Status { status: 500, .. }));
        assert_eq!(err.to_string(), "Failed to fetch API keys (HTTP 500)");
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn test_list_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/api-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([]))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let mut config = ApiClientConfig::new(format!("{}/api", server.uri()));
        config.request_timeout = Duration::from_millis(50);
        let client = ApiKeysClient::new(config).unwrap();

        let err = client.list_api_keys(None).await.unwrap_err();
        assert!(matches!(err, ApiClientError::Timeout));
        assert_eq!(err.to_string(), "API request timed out");
    }

    #[tokio::test]
    async fn test_malformed_listing_is_a_json_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/api-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"keys": []})))
            .mount(&server)
            .await;

        let err = client_for(&server).list_api_keys(None).await.unwrap_err();
        assert!(matches!(err, ApiClientError::Json(_)));
    }

    #[tokio::test]
    async fn test_dev_key_header_is_sent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/api-key"))
            .and(header("x-api-key", "dev-key-0001"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = ApiClientConfig::new(format!("{}/api", server.uri()));
        config.dev_api_key = Some("dev-key-0001".to_string());
        let client = ApiKeysClient::new(config).unwrap();

        assert!(client.list_api_keys(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/api-key/generate"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({"name": "Test Key"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "test-key-123",
                "name": "Test Key",
                "key": "ptk_test_abcdefghijklmnop",
                "createdAt": "2024-03-01T12:00:00Z",
                "expiresAt": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let new_key = NewApiKey::new("  Test Key ").unwrap();
        let generated = client_for(&server).create_api_key(&new_key, None).await.unwrap();

        assert_eq!(generated.id.as_str(), "test-key-123");
        assert_eq!(generated.key, "ptk_test_abcdefghijklmnop");
        assert_eq!(generated.masked_key(), "ptk_********mnop");
    }

    #[tokio::test]
    async fn test_create_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/api-key/generate"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let new_key = NewApiKey::new("Blocked").unwrap();
        let err = client_for(&server).create_api_key(&new_key, None).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to create API key (HTTP 403)");
    }

    #[tokio::test]
    async fn test_revoke_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/api-key/test-key-123"))
            .and(header("authorization", "Bearer t"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .revoke_api_key(&ApiKeyId::from_string("test-key-123"), Some("t"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_revoke_failure() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/api-key/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .revoke_api_key(&ApiKeyId::from_string("missing"), None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to revoke API key (HTTP 404)");
    }

    #[tokio::test]
    async fn test_fetch_keys_as_remote_source() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/api-key"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let source: &dyn RemoteKeySource = &client_for(&server);
        let err = source.fetch_keys(None).await.unwrap_err();

        let client_err = err.downcast_ref::<ApiClientError>().unwrap();
        assert_eq!(client_err.status(), Some(502));
    }

    #[test]
    fn test_endpoint_joins_and_escapes() {
        let client =
            ApiKeysClient::new(ApiClientConfig::new("https://app.thumbdash.dev/api/")).unwrap();

        let url = client.endpoint(&["api-key", "a/b c"]).unwrap();
        assert_eq!(url.as_str(), "https://app.thumbdash.dev/api/api-key/a%2Fb%20c");
    }

    #[test]
    fn test_invalid_base_url() {
        let err = ApiKeysClient::new(ApiClientConfig::new("not a url")).unwrap_err();
        assert!(matches!(err, ApiClientError::Config(_)));

        let err =
            ApiKeysClient::new(ApiClientConfig::new("mailto:team@thumbdash.dev")).unwrap_err();
        assert!(matches!(err, ApiClientError::Config(_)));
    }

    #[test]
    fn test_config_debug_masks_dev_key() {
        let mut config = ApiClientConfig::new("http://localhost:3000/api");
        config.dev_api_key = Some("ptk_test_abcdefghijklmnop".to_string());

        let debug = format!("{config:?}");
        assert!(!debug.contains("abcdefghijklmnop"));
        assert!(debug.contains("ptk_********mnop"));
    }
}
