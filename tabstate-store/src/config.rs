//! Store configuration.

use serde::{Deserialize, Serialize};

/// Default number of snapshots kept for undo.
pub const DEFAULT_MAX_HISTORY: usize = 50;

/// Configuration for a [`Store`](crate::Store).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum snapshots retained in the history ring (at least 1).
    pub max_history: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY,
        }
    }
}
