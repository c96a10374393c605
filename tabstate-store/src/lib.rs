//! Reactive, path-addressable state store for tabstate.
//!
//! A [`Store`] holds one JSON tree addressed by dot-separated paths
//! (`"settings.theme"`). It provides:
//!
//! - copy-on-read / move-on-write access, so callers never alias the tree
//! - hierarchical change notification (exact, wildcard, then ancestors)
//! - a bounded undo history of whole-tree snapshots
//! - computed values recomputed when their dependencies change
//! - scoped views and write-behind persistence to [`tabstate_storage`]
//!
//! # Threading
//!
//! The store is `Send + Sync` and uses short internal locks, but it is
//! designed for a single event-driven thread: notification order is only
//! guaranteed relative to writes made on the same thread.

mod computed;
mod config;
mod error;
mod history;
mod persist;
mod scope;
mod store;
mod subscription;

pub use computed::ComputedBinding;
pub use config::{DEFAULT_MAX_HISTORY, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use scope::ScopedStore;
pub use store::{Store, WeakStore};
pub use subscription::{Change, Listener, Subscription};
pub use tabstate_types::{StatePath, WILDCARD};
