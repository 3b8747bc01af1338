//! The local collection capability consumed by the sync coordinator.

use crate::error::StoreResult;
use api_key_types::{ApiKeyId, ApiKeyRecord};
use tracing::trace;

/// A keyed collection of [`ApiKeyRecord`]s.
///
/// Implementations must be cheap and synchronous. The coordinator relies on
/// the fact that none of these calls yield to the async scheduler.
pub trait KeyCollection: Send + Sync {
    /// Ids of every record currently held.
    fn keys(&self) -> Vec<ApiKeyId>;

    /// Looks up one record.
    fn get(&self, id: &ApiKeyId) -> Option<ApiKeyRecord>;

    /// Inserts a record. Fails with `StoreError::DuplicateKey` if the id is
    /// already present.
    fn insert(&self, record: ApiKeyRecord) -> StoreResult<()>;

    /// Removes a record. Returns `Ok(false)` when the id was not present.
    fn delete(&self, id: &ApiKeyId) -> StoreResult<bool>;

    /// Every record, newest first.
    fn list(&self) -> Vec<ApiKeyRecord>;

    fn len(&self) -> usize {
        self.keys().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Makes the collection hold exactly `records`.
    ///
    /// The provided implementation goes through the primitive operations and
    /// is not atomic: a failure midway leaves whatever the delete/insert loop
    /// had already done. Stores that can swap their contents in one step
    /// should override it.
    fn replace_all(&self, records: Vec<ApiKeyRecord>) -> StoreResult<()> {
        replace_by_primitives(self, records)
    }
}

/// Bulk replace built on `keys`, `delete` and `insert`.
///
/// Deletes every existing id, then inserts each record exactly once.
pub fn replace_by_primitives<C>(collection: &C, records: Vec<ApiKeyRecord>) -> StoreResult<()>
where
    C: KeyCollection + ?Sized,
{
    let existing = collection.keys();
    let removed = existing.len();
    for id in existing {
        collection.delete(&id)?;
    }

    let inserted = records.len();
    for record in records {
        collection.insert(record)?;
    }

    trace!(removed, inserted, "Replaced collection via primitive operations");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// Collection that only implements the primitives and counts calls.
    #[derive(Default)]
    struct PrimitiveCollection {
        records: Mutex<BTreeMap<ApiKeyId, ApiKeyRecord>>,
        inserts: Mutex<usize>,
        deletes: Mutex<usize>,
    }

    impl KeyCollection for PrimitiveCollection {
        fn keys(&self) -> Vec<ApiKeyId> {
            self.records.lock().unwrap().keys().cloned().collect()
        }

        fn get(&self, id: &ApiKeyId) -> Option<ApiKeyRecord> {
            self.records.lock().unwrap().get(id).cloned()
        }

        fn insert(&self, record: ApiKeyRecord) -> StoreResult<()> {
            *self.inserts.lock().unwrap() += 1;
            let mut records = self.records.lock().unwrap();
            if records.contains_key(&record.id) {
                return Err(StoreError::DuplicateKey(record.id));
            }
            records.insert(record.id.clone(), record);
            Ok(())
        }

        fn delete(&self, id: &ApiKeyId) -> StoreResult<bool> {
            *self.deletes.lock().unwrap() += 1;
            Ok(self.records.lock().unwrap().remove(id).is_some())
        }

        fn list(&self) -> Vec<ApiKeyRecord> {
            self.records.lock().unwrap().values().cloned().collect()
        }
    }

    fn record(id: &str) -> ApiKeyRecord {
        ApiKeyRecord {
            id: ApiKeyId::from_string(id),
            name: format!("key {id}"),
            identifier: format!("ptk_****{id}"),
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            expires_at: None,
            last_used_at: None,
            enabled: true,
        }
    }

    #[test]
    fn default_replace_removes_stale_and_inserts_each_record_once() {
        let collection = PrimitiveCollection::default();
        collection.insert(record("a")).unwrap();
        collection.insert(record("b")).unwrap();
        *collection.inserts.lock().unwrap() = 0;

        collection
            .replace_all(vec![record("b"), record("c")])
            .unwrap();

        let keys: Vec<_> = collection.keys().into_iter().map(|k| k.0).collect();
        assert_eq!(keys, vec!["b", "c"]);
        assert_eq!(*collection.deletes.lock().unwrap(), 2);
        assert_eq!(*collection.inserts.lock().unwrap(), 2);
    }

    #[test]
    fn default_replace_with_empty_list_clears() {
        let collection = PrimitiveCollection::default();
        collection.insert(record("a")).unwrap();

        collection.replace_all(Vec::new()).unwrap();

        assert!(collection.is_empty());
    }

    #[test]
    fn default_replace_surfaces_duplicate_and_leaves_partial_state() {
        let collection = PrimitiveCollection::default();
        collection.insert(record("a")).unwrap();

        let err = collection
            .replace_all(vec![record("x"), record("x"), record("y")])
            .unwrap_err();

        assert_eq!(err, StoreError::DuplicateKey(ApiKeyId::from_string("x")));
        // The primitive loop is not atomic: "a" is gone and only "x" landed.
        let keys: Vec<_> = collection.keys().into_iter().map(|k| k.0).collect();
        assert_eq!(keys, vec!["x"]);
    }
}
