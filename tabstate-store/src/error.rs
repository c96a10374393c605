//! Error types for the store.

use tabstate_storage::StorageError;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
///
/// Missing paths are never errors; reads fall back to defaults instead.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Registering a computed value would make it depend on itself.
    #[error("computed value at '{path}' would depend on itself")]
    ComputedCycle { path: String },

    /// A computed dependency cannot be observed.
    #[error("invalid computed dependency: {0}")]
    InvalidDependency(String),

    /// A typed value could not be converted to or from JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Writing a snapshot to storage failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
