//! The persistent medium underneath [`Storage`](crate::Storage).
//!
//! A medium is a synchronous, string-keyed key-value surface shared by every
//! execution context that opens it. It knows nothing about namespaces,
//! envelopes or expiry.

use crate::error::{StorageError, StorageResult};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A synchronous string key-value store.
pub trait Medium: Send + Sync {
    /// Reads the raw string stored under `key`.
    fn get_item(&self, key: &str) -> Option<String>;

    /// Writes `value` under `key`. May fail when the medium is full.
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Deletes `key`. Deleting an absent key is not an error.
    fn remove_item(&self, key: &str);

    /// Lists every key currently stored, in any namespace.
    fn keys(&self) -> Vec<String>;
}

/// An in-memory medium with an optional capacity limit.
///
/// Capacity is measured as the sum of key and value lengths in bytes.
#[derive(Debug, Default)]
pub struct MemoryMedium {
    items: Mutex<BTreeMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryMedium {
    /// Creates an unbounded medium.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a medium that rejects writes beyond `bytes` in total.
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            items: Mutex::new(BTreeMap::new()),
            quota: Some(bytes),
        }
    }

    /// Total bytes currently used.
    pub fn used_bytes(&self) -> usize {
        self.lock().iter().map(|(k, v)| k.len() + v.len()).sum()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Medium for MemoryMedium {
    fn get_item(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut items = self.lock();
        if let Some(quota) = self.quota {
            let used: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = key.len() + value.len();
            let available = quota.saturating_sub(used);
            if needed > available {
                return Err(StorageError::QuotaExceeded { needed, available });
            }
        }
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) {
        self.lock().remove(key);
    }

    fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }
}
