//! Storage configuration.

use crate::bus::DEFAULT_BUS_CAPACITY;
use serde::{Deserialize, Serialize};

/// Default key prefix isolating this application's entries.
pub const DEFAULT_NAMESPACE: &str = "app_";

/// Default origin reported on published change events.
pub const DEFAULT_ORIGIN: &str = "local://tabstate";

/// Configuration for a [`Storage`](crate::Storage) handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Prefix prepended to every logical key on the medium.
    pub namespace: String,
    /// Origin reported on change events published by this context.
    pub origin: String,
    /// Whether this context's own writes invoke its own change listeners.
    pub notify_self: bool,
    /// Events buffered per context when a bus is created from this config.
    pub bus_capacity: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
            notify_self: true,
            bus_capacity: DEFAULT_BUS_CAPACITY,
        }
    }
}

impl StorageConfig {
    /// Config with a custom namespace and defaults elsewhere.
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    /// Prefix used for session-scoped keys.
    pub fn session_namespace(&self) -> String {
        format!("{}session:", self.namespace)
    }
}
