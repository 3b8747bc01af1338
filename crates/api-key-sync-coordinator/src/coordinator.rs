//! The sync coordinator and its worker loop.

use crate::error::{KeySyncError, KeySyncResult};
use crate::source::RemoteKeySource;
use api_key_collection::KeyCollection;
use api_key_types::ApiKeyRecord;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// How requests that queue up behind a running cycle are serviced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueuePolicy {
    /// Every queued request gets its own fetch-and-replace cycle.
    #[default]
    PerRequest,
    /// All requests waiting when a cycle starts (with the same token) share
    /// that cycle's result.
    Coalesce,
}

/// Configuration for [`SyncCoordinator`].
#[derive(Debug, Clone, Default)]
pub struct SyncCoordinatorConfig {
    pub queue_policy: QueuePolicy,
}

/// Whether a cycle is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Syncing,
}

/// Counters describing the coordinator's work so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncStats {
    pub state: SyncState,
    pub cycles_started: u64,
    pub cycles_succeeded: u64,
    pub cycles_failed: u64,
    /// Requests queued but not yet attached to a cycle.
    pub pending_requests: usize,
}

type SyncResponder = oneshot::Sender<KeySyncResult<Vec<ApiKeyRecord>>>;

/// A caller waiting for a cycle.
struct SyncRequest {
    token: Option<String>,
    responder: SyncResponder,
}

/// State shared between the handle and the worker.
#[derive(Default)]
struct Shared {
    syncing: AtomicBool,
    pending: AtomicUsize,
    cycles_started: AtomicU64,
    cycles_succeeded: AtomicU64,
    cycles_failed: AtomicU64,
}

/// Serializes "refresh API keys from remote" requests.
///
/// At most one fetch-and-replace cycle runs at a time. A request made while
/// a cycle is running waits for a later cycle, so every caller receives data
/// fetched after its own call. A failed cycle only fails the callers attached
/// to it; the next queued request still runs its own cycle.
///
/// Cloning the coordinator clones the handle; all clones feed the same
/// worker, which stops once every handle has been dropped and the queue has
/// drained.
#[derive(Clone)]
pub struct SyncCoordinator {
    sender: mpsc::UnboundedSender<SyncRequest>,
    shared: Arc<Shared>,
}

impl SyncCoordinator {
    /// Creates a coordinator and spawns its worker on `runtime`.
    pub fn new(
        source: Arc<dyn RemoteKeySource>,
        collection: Arc<dyn KeyCollection>,
        config: SyncCoordinatorConfig,
        runtime: tokio::runtime::Handle,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared::default());

        let worker = Worker {
            receiver,
            backlog: VecDeque::new(),
            source,
            collection,
            policy: config.queue_policy,
            shared: shared.clone(),
        };
        runtime.spawn(worker.run());

        Self { sender, shared }
    }

    /// Requests a full refresh of the local collection from the remote
    /// source and resolves with the list fetched by the cycle serving it.
    ///
    /// The request is queued when this method is called, not when the
    /// returned future is first polled. Dropping the future does not cancel
    /// the request; its cycle still runs.
    pub fn sync_with_lock(
        &self,
        token: Option<&str>,
    ) -> impl Future<Output = KeySyncResult<Vec<ApiKeyRecord>>> + Send + 'static {
        let enqueued = self.enqueue(token);
        async move {
            let receiver = enqueued?;
            match receiver.await {
                Ok(result) => result,
                Err(_) => Err(KeySyncError::Stopped),
            }
        }
    }

    fn enqueue(
        &self,
        token: Option<&str>,
    ) -> KeySyncResult<oneshot::Receiver<KeySyncResult<Vec<ApiKeyRecord>>>> {
        let (responder, receiver) = oneshot::channel();
        let request = SyncRequest {
            token: token.map(str::to_string),
            responder,
        };

        self.shared.pending.fetch_add(1, Ordering::SeqCst);
        if self.sender.send(request).is_err() {
            self.shared.pending.fetch_sub(1, Ordering::SeqCst);
            warn!("Sync requested after the coordinator worker stopped");
            return Err(KeySyncError::Stopped);
        }

        if self.shared.syncing.load(Ordering::SeqCst) {
            debug!("Sync cycle in flight, request queued");
        }
        Ok(receiver)
    }

    pub fn state(&self) -> SyncState {
        if self.shared.syncing.load(Ordering::SeqCst) {
            SyncState::Syncing
        } else {
            SyncState::Idle
        }
    }

    pub fn stats(&self) -> SyncStats {
        SyncStats {
            state: self.state(),
            cycles_started: self.shared.cycles_started.load(Ordering::SeqCst),
            cycles_succeeded: self.shared.cycles_succeeded.load(Ordering::SeqCst),
            cycles_failed: self.shared.cycles_failed.load(Ordering::SeqCst),
            pending_requests: self.shared.pending.load(Ordering::SeqCst),
        }
    }

    /// Whether the worker is still accepting requests.
    pub fn is_running(&self) -> bool {
        !self.sender.is_closed()
    }
}

impl std::fmt::Debug for SyncCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncCoordinator")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

/// The single task that runs cycles.
struct Worker {
    receiver: mpsc::UnboundedReceiver<SyncRequest>,
    /// Requests pulled off the channel but left for a later cycle.
    backlog: VecDeque<SyncRequest>,
    source: Arc<dyn RemoteKeySource>,
    collection: Arc<dyn KeyCollection>,
    policy: QueuePolicy,
    shared: Arc<Shared>,
}

impl Worker {
    async fn run(mut self) {
        debug!(policy = ?self.policy, "Sync coordinator worker started");

        while let Some(batch) = self.next_batch().await {
            self.shared.pending.fetch_sub(batch.len(), Ordering::SeqCst);
            self.shared.syncing.store(true, Ordering::SeqCst);
            let cycle = self.shared.cycles_started.fetch_add(1, Ordering::SeqCst) + 1;

            let token = batch[0].token.clone();
            let result = perform_bulk_sync(
                self.source.as_ref(),
                self.collection.as_ref(),
                cycle,
                token.as_deref(),
                batch.len(),
            )
            .await;

            match &result {
                Ok(_) => self.shared.cycles_succeeded.fetch_add(1, Ordering::SeqCst),
                Err(_) => self.shared.cycles_failed.fetch_add(1, Ordering::SeqCst),
            };
            self.shared.syncing.store(false, Ordering::SeqCst);

            for request in batch {
                if request.responder.send(result.clone()).is_err() {
                    debug!(cycle, "Sync caller went away before its cycle finished");
                }
            }
        }

        debug!("Sync coordinator worker stopped");
    }

    /// Waits for the next request and gathers the requests that share its
    /// cycle.
    async fn next_batch(&mut self) -> Option<Vec<SyncRequest>> {
        let first = match self.backlog.pop_front() {
            Some(request) => request,
            None => self.receiver.recv().await?,
        };

        if self.policy == QueuePolicy::PerRequest {
            return Some(vec![first]);
        }

        while let Ok(request) = self.receiver.try_recv() {
            self.backlog.push_back(request);
        }

        let (mut batch, rest): (Vec<_>, Vec<_>) = self
            .backlog
            .drain(..)
            .partition(|request| request.token == first.token);
        self.backlog = rest.into();
        batch.insert(0, first);

        Some(batch)
    }
}

/// One cycle: fetch the remote list, then make the collection equal it.
async fn perform_bulk_sync(
    source: &dyn RemoteKeySource,
    collection: &dyn KeyCollection,
    cycle: u64,
    token: Option<&str>,
    waiters: usize,
) -> KeySyncResult<Vec<ApiKeyRecord>> {
    let started = Instant::now();
    debug!(cycle, waiters, "Sync cycle started");

    let records = match source.fetch_keys(token).await {
        Ok(records) => records,
        Err(error) => {
            warn!(cycle, error = %error, "Sync cycle failed to fetch API keys");
            return Err(KeySyncError::fetch(error));
        }
    };

    if let Err(error) = collection.replace_all(records.clone()) {
        warn!(cycle, error = %error, "Sync cycle failed to replace local API keys");
        return Err(error.into());
    }

    info!(
        cycle,
        waiters,
        records = records.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Sync cycle completed"
    );
    Ok(records)
}
