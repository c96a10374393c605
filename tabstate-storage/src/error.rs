//! Error types for the storage layer.

use tabstate_codec::CodecError;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
///
/// Reads never surface these: a missing, expired or unreadable entry is
/// reported as absent. Only writes return them.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The medium refused the write because it is full.
    #[error("quota exceeded: needed {needed} bytes, {available} available")]
    QuotaExceeded { needed: usize, available: usize },

    /// Envelope encoding error.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Value serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error (file-backed media).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
