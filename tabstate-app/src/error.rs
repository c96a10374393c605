//! Error types for the application layer.

use tabstate_storage::StorageError;
use tabstate_store::StoreError;
use thiserror::Error;

/// Result type for application operations.
pub type AppResult<T> = Result<T, AppError>;

/// Errors raised while configuring or opening application state.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
