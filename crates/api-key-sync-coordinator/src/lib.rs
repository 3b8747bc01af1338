//! # api-key-sync-coordinator
//!
//! Keeps the local API-key collection equal to the remote key list when
//! several parts of the dashboard ask for a refresh at overlapping times
//! (initial load, after generating a key, after revoking one).
//!
//! ## Architecture
//!
//! ```text
//! sync_with_lock() ──▶ ┌──────────────┐     ┌──────────────────┐
//! sync_with_lock() ──▶ │ request queue│────▶│  worker (1 task) │
//! sync_with_lock() ──▶ │    (MPSC)    │     │ fetch ─▶ replace │
//!                      └──────────────┘     └────────┬─────────┘
//!                                                    │ oneshot per caller
//!                                                    ▼
//!                                            resolved key list
//! ```
//!
//! ## Guarantees
//!
//! - **Mutual exclusion**: one fetch-and-replace cycle at a time
//! - **Freshness**: a caller is served by a cycle that started after its call
//! - **Fidelity**: each caller receives the list fetched by its own cycle
//! - **Failure isolation**: a failed cycle only fails its own callers and
//!   never blocks the queue
//! - **No retries**: retrying is the caller's decision
//!
//! ## Example
//!
//! ```ignore
//! let coordinator = SyncCoordinator::new(
//!     source,
//!     collection,
//!     SyncCoordinatorConfig::default(),
//!     tokio::runtime::Handle::current(),
//! );
//!
//! let keys = coordinator.sync_with_lock(Some(&access_token)).await?;
//! ```

mod coordinator;
mod error;
mod source;

#[cfg(test)]
mod tests;

pub use coordinator::{QueuePolicy, SyncCoordinator, SyncCoordinatorConfig, SyncState, SyncStats};
pub use error::{BoxedSourceError, KeySyncError, KeySyncResult};
pub use source::RemoteKeySource;
