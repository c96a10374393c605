//! Error types for the codec layer.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding durable entries.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The envelope is not valid JSON or does not have the expected shape.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The input carries the obfuscation marker but cannot be reversed.
    #[error("obfuscation error: {0}")]
    Obfuscation(String),

    /// The envelope was written by a newer format version.
    #[error("unsupported entry version: found {found}, supported up to {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}
