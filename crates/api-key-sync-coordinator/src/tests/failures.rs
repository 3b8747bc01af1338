//! Failed cycles stay contained to their own callers.

use super::harness::*;
use crate::{KeySyncError, QueuePolicy, SyncCoordinator, SyncCoordinatorConfig};
use api_key_collection::InMemoryKeyCollection;
use std::sync::Arc;

#[tokio::test(start_paused = true)]
async fn failure_only_rejects_its_own_caller() {
    let source = ScriptedKeySource::scripted(vec![
        Scripted::Tagged,
        Scripted::Fail("server down"),
        Scripted::Tagged,
    ]);
    let (coordinator, source, collection) = setup(source, QueuePolicy::PerRequest);

    let (a, b, c) = tokio::join!(
        coordinator.sync_with_lock(None),
        coordinator.sync_with_lock(None),
        coordinator.sync_with_lock(None)
    );

    assert_eq!(fetch_tag(&a.unwrap()), 1);
    let err = b.unwrap_err();
    assert!(matches!(err, KeySyncError::Fetch(_)));
    assert_eq!(fetch_tag(&c.unwrap()), 3);

    assert_eq!(source.fetch_count(), 3);
    assert_eq!(sorted_ids(collection.as_ref()), vec!["only-3", "shared"]);

    let stats = coordinator.stats();
    assert_eq!(stats.cycles_succeeded, 2);
    assert_eq!(stats.cycles_failed, 1);
}

#[tokio::test(start_paused = true)]
async fn failed_fetch_keeps_the_previous_collection() {
    let source = Arc::new(ScriptedKeySource::scripted(vec![Scripted::Fail("timeout")]));
    let collection = Arc::new(InMemoryKeyCollection::with_records(vec![record("a")]).unwrap());
    let coordinator = coordinator_with(source.clone(), collection.clone(), QueuePolicy::PerRequest);

    let err = coordinator.sync_with_lock(None).await.unwrap_err();

    assert_eq!(err.to_string(), "Remote fetch failed: scripted failure: timeout");
    let upstream = err.fetch_source().unwrap();
    assert!(upstream.downcast_ref::<ScriptedFailure>().is_some());

    assert_eq!(sorted_ids(collection.as_ref()), vec!["a"]);
    assert_eq!(source.fetch_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn store_failure_is_reported_and_the_queue_moves_on() {
    let source = ScriptedKeySource::scripted(vec![
        Scripted::Records(vec![record("dup"), record("dup")]),
        Scripted::Tagged,
    ]);
    let (coordinator, _source, collection) = setup(source, QueuePolicy::PerRequest);

    let (a, b) = tokio::join!(coordinator.sync_with_lock(None), coordinator.sync_with_lock(None));

    assert!(matches!(a.unwrap_err(), KeySyncError::Store(_)));
    assert_eq!(fetch_tag(&b.unwrap()), 2);
    assert_eq!(sorted_ids(collection.as_ref()), vec!["only-2", "shared"]);
}

#[tokio::test(start_paused = true)]
async fn dropped_caller_does_not_cancel_its_cycle() {
    let (coordinator, source, _collection) =
        setup(ScriptedKeySource::new(), QueuePolicy::PerRequest);

    drop(coordinator.sync_with_lock(None));
    let keys = coordinator.sync_with_lock(None).await.unwrap();

    assert_eq!(fetch_tag(&keys), 2);
    assert_eq!(source.fetch_count(), 2);
}

#[test]
fn requests_after_the_worker_stops_fail() {
    let worker_runtime = tokio::runtime::Runtime::new().unwrap();
    let coordinator = SyncCoordinator::new(
        Arc::new(ScriptedKeySource::new()),
        Arc::new(InMemoryKeyCollection::new()),
        SyncCoordinatorConfig::default(),
        worker_runtime.handle().clone(),
    );
    drop(worker_runtime);

    assert!(!coordinator.is_running());

    let caller_runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let result = caller_runtime.block_on(coordinator.sync_with_lock(None));
    assert!(matches!(result, Err(KeySyncError::Stopped)));
    assert_eq!(coordinator.stats().pending_requests, 0);
}
