//! Write-behind persistence between a [`Store`] and [`Storage`].
//!
//! The store never reads through storage on access. These bindings copy
//! subtrees out to storage when they change, load them once at start-up, and
//! apply changes published by other contexts back into the tree.

use crate::error::StoreResult;
use crate::store::Store;
use crate::subscription::Subscription;
use serde_json::Value;
use tabstate_storage::{ChangeSubscription, Storage};
use tabstate_types::StatePath;
use tracing::{debug, warn};

fn touches(watched: &StatePath, source: &StatePath) -> bool {
    watched == source || watched.is_ancestor_of(source) || source.is_ancestor_of(watched)
}

impl Store {
    /// Writes the subtree at `path` to `key` whenever it changes, including
    /// changes caused by undo and reset. Removes `key` when the subtree is
    /// deleted.
    ///
    /// Writes that would store the value already present are skipped, which
    /// stops changes received from other contexts from being echoed back.
    pub fn persist_path(&self, storage: &Storage, path: &str, key: &str) -> Subscription {
        let watched = StatePath::parse(path);
        let weak = self.downgrade();
        let storage = storage.clone();
        let key = key.to_string();

        self.on_any_change(move |change| {
            if !touches(&watched, &StatePath::parse(&change.source)) {
                return;
            }
            let Some(store) = weak.upgrade() else {
                return;
            };
            let current = store.get_at(&watched);
            if storage.get_value(&key) == current {
                return;
            }
            match current {
                Some(value) => {
                    if let Err(e) = storage.set(&key, &value) {
                        warn!(key = %key, error = %e, "failed to persist state");
                    }
                }
                None => storage.remove(&key),
            }
        })
    }

    /// Loads `key` from storage into `path`, if present. Returns true when a
    /// value was loaded.
    pub fn hydrate_path(&self, storage: &Storage, key: &str, path: &str) -> bool {
        match storage.get_value(key) {
            Some(value) => {
                debug!(key, path, "hydrating from storage");
                self.set(path, value);
                true
            }
            None => false,
        }
    }

    /// Applies changes to `key` made by other contexts to `path`.
    ///
    /// A removal writes `null`. Values equal to what the tree already holds
    /// are ignored, so this context's own persisted writes do not loop back.
    pub fn follow_remote(&self, storage: &Storage, key: &str, path: &str) -> ChangeSubscription {
        let weak = self.downgrade();
        let target = StatePath::parse(path);

        storage.on_change(key, move |value| {
            let Some(store) = weak.upgrade() else {
                return;
            };
            let incoming = value.cloned().unwrap_or(Value::Null);
            let current = store.get_at(&target);
            if current.as_ref() == Some(&incoming) || (current.is_none() && incoming.is_null()) {
                return;
            }
            store.set_at(&target, incoming);
        })
    }

    /// Persists the whole tree under `key`.
    pub fn save_snapshot(&self, storage: &Storage, key: &str) -> StoreResult<()> {
        storage.set(key, &self.snapshot())?;
        Ok(())
    }

    /// Replaces the whole tree with the snapshot stored under `key`. Returns
    /// false when there is none. The load is recorded in history.
    pub fn load_snapshot(&self, storage: &Storage, key: &str) -> bool {
        match storage.get_value(key) {
            Some(tree) => {
                self.set_at(&StatePath::root(), tree);
                true
            }
            None => false,
        }
    }
}
