//! # api-key-collection
//!
//! The dashboard's local view of the caller's API keys.
//!
//! ## Principles
//!
//! - The collection mirrors the remote key list; it is only ever rewritten
//!   wholesale by a sync cycle
//! - Subscribers are notified after a mutation has been applied
//! - Operations are synchronous, so a bulk replace cannot be interleaved with
//!   another task's mutation
//!
//! ## Example
//!
//! ```rust
//! use api_key_collection::{CollectionChange, InMemoryKeyCollection, KeyCollection};
//!
//! let collection = InMemoryKeyCollection::new();
//! let subscription = collection.subscribe();
//!
//! collection.replace_all(Vec::new()).unwrap();
//!
//! assert!(collection.is_empty());
//! assert!(matches!(
//!     subscription.try_recv(),
//!     Some(CollectionChange::Replaced { .. })
//! ));
//! ```

mod collection;
mod error;
pub mod live;
mod memory;

pub use collection::{replace_by_primitives, KeyCollection};
pub use error::{StoreError, StoreResult};
pub use live::{CollectionChange, CollectionSubscription, LiveHub};
pub use memory::InMemoryKeyCollection;
