//! Session-scoped storage.
//!
//! Lives only as long as the owning [`Storage`](crate::Storage) handle (one
//! execution context). Values are stored as plain JSON with no envelope, no
//! expiry and no change events.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::warn;

use crate::error::StorageResult;

/// Per-context key-value store.
#[derive(Debug)]
pub struct SessionStorage {
    prefix: String,
    items: Mutex<BTreeMap<String, String>>,
}

impl SessionStorage {
    pub(crate) fn new(prefix: String) -> Self {
        Self {
            prefix,
            items: Mutex::new(BTreeMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn physical_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Stores `value` under `key`.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StorageResult<()> {
        let json = serde_json::to_string(value)?;
        self.lock().insert(self.physical_key(key), json);
        Ok(())
    }

    /// Reads `key`, returning `None` when absent or unreadable as `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.lock().get(&self.physical_key(key)).cloned()?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "unreadable session entry");
                None
            }
        }
    }

    /// Reads `key` as a raw JSON value.
    pub fn get_value(&self, key: &str) -> Option<Value> {
        self.get(key)
    }

    /// Reads `key`, falling back to `default`.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Deletes `key`.
    pub fn remove(&self, key: &str) {
        self.lock().remove(&self.physical_key(key));
    }

    /// Deletes every session key.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Logical keys currently present.
    pub fn keys(&self) -> Vec<String> {
        self.lock()
            .keys()
            .filter_map(|k| k.strip_prefix(&self.prefix).map(str::to_string))
            .collect()
    }
}
