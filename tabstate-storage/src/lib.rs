//! Storage substrate for tabstate.
//!
//! Provides durable, expiring, optionally obfuscated key-value persistence
//! over a pluggable [`Medium`], with best-effort change propagation between
//! execution contexts that share it.
//!
//! # Architecture
//!
//! - [`Medium`] is the raw string key-value surface ([`MemoryMedium`],
//!   [`FileMedium`]); several contexts may share one.
//! - [`Storage`] namespaces keys, wraps values in a versioned envelope,
//!   expires entries lazily on read and publishes writes on a [`ChangeBus`].
//! - [`SessionStorage`] is a per-context surface with no expiry and no events.

mod bus;
mod config;
mod error;
mod file_medium;
mod medium;
mod session;
mod storage;

pub use bus::{ChangeBus, DEFAULT_BUS_CAPACITY, StorageEvent};
pub use config::{DEFAULT_NAMESPACE, DEFAULT_ORIGIN, StorageConfig};
pub use error::{StorageError, StorageResult};
pub use file_medium::FileMedium;
pub use medium::{Medium, MemoryMedium};
pub use session::SessionStorage;
pub use storage::{
    ChangeListener, ChangeSubscription, ReadOptions, Storage, StorageBuilder, WriteOptions,
};
