//! Core type definitions for tabstate.
//!
//! This crate defines the primitives shared by the storage and store layers:
//! - Dot-separated state paths and their ancestor walk
//! - Epoch-millisecond timestamps and an injectable clock
//! - Execution context identifiers (UUID v7)

mod ids;
mod path;
mod timestamp;

pub use ids::ContextId;
pub use path::{StatePath, WILDCARD};
pub use timestamp::{Clock, ManualClock, SharedClock, SystemClock, Timestamp};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid context id: {0}")]
    InvalidContextId(#[from] uuid::Error),
}
