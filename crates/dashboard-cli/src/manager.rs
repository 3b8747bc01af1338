//! Wires the API client, the local collection and the sync coordinator
//! together for one CLI invocation.

use anyhow::{Context, Result};
use api_key_collection::{CollectionSubscription, InMemoryKeyCollection, KeyCollection};
use api_key_sync_coordinator::{
    KeySyncResult, QueuePolicy, SyncCoordinator, SyncCoordinatorConfig,
};
use api_key_types::{ApiKeyId, ApiKeyRecord, GeneratedApiKey, NewApiKey};
use api_keys_client::{ApiClientConfig, ApiKeysClient};
use dashboard_config_and_utils::Config;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of a mutation followed by a refresh.
///
/// The mutation itself succeeded; `refreshed` tells whether the local
/// collection caught up with it.
#[derive(Debug)]
pub struct Refreshed<T> {
    pub value: T,
    pub refreshed: KeySyncResult<Vec<ApiKeyRecord>>,
}

pub struct KeysManager {
    client: ApiKeysClient,
    collection: Arc<InMemoryKeyCollection>,
    coordinator: SyncCoordinator,
    token: Option<String>,
}

impl KeysManager {
    /// Build a manager from the effective configuration. Must be called
    /// inside a tokio runtime.
    pub fn from_config(config: &Config, token: Option<String>) -> Result<Self> {
        let client = ApiKeysClient::new(ApiClientConfig {
            base_url: config.api_base_url.clone(),
            request_timeout: config.request_timeout(),
            dev_api_key: config.effective_dev_api_key().map(str::to_string),
        })
        .context("Failed to create API client")?;

        let queue_policy = if config.coalesce_syncs {
            QueuePolicy::Coalesce
        } else {
            QueuePolicy::PerRequest
        };

        Ok(Self::new(client, queue_policy, token))
    }

    pub fn new(client: ApiKeysClient, queue_policy: QueuePolicy, token: Option<String>) -> Self {
        let collection = Arc::new(InMemoryKeyCollection::new());
        let coordinator = SyncCoordinator::new(
            Arc::new(client.clone()),
            collection.clone(),
            SyncCoordinatorConfig { queue_policy },
            tokio::runtime::Handle::current(),
        );

        Self {
            client,
            collection,
            coordinator,
            token,
        }
    }

    pub fn collection(&self) -> &InMemoryKeyCollection {
        &self.collection
    }

    pub fn coordinator(&self) -> &SyncCoordinator {
        &self.coordinator
    }

    pub fn subscribe(&self) -> CollectionSubscription {
        self.collection.subscribe()
    }

    /// Current local view, newest first.
    pub fn keys(&self) -> Vec<ApiKeyRecord> {
        self.collection.list()
    }

    /// Bring the local collection in line with the server.
    pub async fn refresh(&self) -> KeySyncResult<Vec<ApiKeyRecord>> {
        self.coordinator.sync_with_lock(self.token.as_deref()).await
    }

    /// Generate a key, then refresh.
    pub async fn generate(&self, name: &str) -> Result<Refreshed<GeneratedApiKey>> {
        let new_key = NewApiKey::new(name)?;
        let generated = self
            .client
            .create_api_key(&new_key, self.token.as_deref())
            .await?;

        let refreshed = self.refresh().await;
        if let Err(error) = &refreshed {
            warn!(key_id = %generated.id, %error, "Key generated but refresh failed");
        }

        Ok(Refreshed {
            value: generated,
            refreshed,
        })
    }

    /// Revoke a key, then refresh.
    pub async fn revoke(&self, id: &ApiKeyId) -> Result<Refreshed<()>> {
        self.client.revoke_api_key(id, self.token.as_deref()).await?;

        let refreshed = self.refresh().await;
        match &refreshed {
            Ok(_) => info!(key_id = %id, "Key revoked and collection refreshed"),
            Err(error) => warn!(key_id = %id, %error, "Key revoked but refresh failed"),
        }

        Ok(Refreshed {
            value: (),
            refreshed,
        })
    }
}
