//! In-memory reactive implementation of [`KeyCollection`].

use crate::collection::KeyCollection;
use crate::error::{StoreError, StoreResult};
use crate::live::{CollectionChange, CollectionSubscription, LiveHub};
use api_key_types::{ApiKeyId, ApiKeyRecord};
use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Process-local API-key collection with change notifications.
///
/// `replace_all` validates the incoming records and then swaps the whole map
/// under one write lock, so concurrent readers see either the old contents
/// or the new ones and never a mix.
#[derive(Debug, Default)]
pub struct InMemoryKeyCollection {
    records: RwLock<HashMap<ApiKeyId, ApiKeyRecord>>,
    live: LiveHub,
}

impl InMemoryKeyCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a collection pre-populated with `records`.
    pub fn with_records(records: Vec<ApiKeyRecord>) -> StoreResult<Self> {
        let collection = Self::new();
        *collection.write() = index_records(records)?;
        Ok(collection)
    }

    /// Subscribes to changes applied from now on.
    pub fn subscribe(&self) -> CollectionSubscription {
        self.live.subscribe()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<ApiKeyId, ApiKeyRecord>> {
        self.records
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ApiKeyId, ApiKeyRecord>> {
        self.records
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Builds the id index, refusing duplicate ids.
fn index_records(records: Vec<ApiKeyRecord>) -> StoreResult<HashMap<ApiKeyId, ApiKeyRecord>> {
    let mut seen = HashSet::with_capacity(records.len());
    let mut map = HashMap::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.id.clone()) {
            return Err(StoreError::DuplicateKey(record.id));
        }
        map.insert(record.id.clone(), record);
    }
    Ok(map)
}

fn newest_first(records: &mut [ApiKeyRecord]) {
    records.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

impl KeyCollection for InMemoryKeyCollection {
    fn keys(&self) -> Vec<ApiKeyId> {
        self.read().keys().cloned().collect()
    }

    fn get(&self, id: &ApiKeyId) -> Option<ApiKeyRecord> {
        self.read().get(id).cloned()
    }

    fn insert(&self, record: ApiKeyRecord) -> StoreResult<()> {
        let mut records = self.write();
        if records.contains_key(&record.id) {
            return Err(StoreError::DuplicateKey(record.id));
        }
        records.insert(record.id.clone(), record.clone());
        self.live.notify(CollectionChange::Inserted(record));
        Ok(())
    }

    fn delete(&self, id: &ApiKeyId) -> StoreResult<bool> {
        let mut records = self.write();
        let removed = records.remove(id).is_some();
        if removed {
            self.live.notify(CollectionChange::Deleted(id.clone()));
        }
        Ok(removed)
    }

    fn list(&self) -> Vec<ApiKeyRecord> {
        let mut records: Vec<_> = self.read().values().cloned().collect();
        newest_first(&mut records);
        records
    }

    fn len(&self) -> usize {
        self.read().len()
    }

    fn replace_all(&self, records: Vec<ApiKeyRecord>) -> StoreResult<()> {
        let keys: Vec<ApiKeyId> = records.iter().map(|r| r.id.clone()).collect();
        let next = index_records(records)?;

        let mut current = self.write();
        let previous = std::mem::replace(&mut *current, next);
        self.live.notify(CollectionChange::Replaced { keys });

        debug!(
            previous = previous.len(),
            current = current.len(),
            "API key collection replaced"
        );
        Ok(())
    }
}
