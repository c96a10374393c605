//! Path-prefixed views over a store.

use crate::store::Store;
use crate::subscription::{Change, Subscription};
use serde_json::Value;
use tabstate_types::StatePath;

/// A view of a [`Store`] rooted at a base path.
///
/// This is prefixing sugar only: there is no isolation, and the scoped view
/// shares the tree, history and listeners of the underlying store.
#[derive(Clone, Debug)]
pub struct ScopedStore {
    store: Store,
    base: StatePath,
}

impl ScopedStore {
    pub(crate) fn new(store: Store, base: StatePath) -> Self {
        Self { store, base }
    }

    /// The base path of this view.
    pub fn base(&self) -> &StatePath {
        &self.base
    }

    /// The underlying store.
    pub fn store(&self) -> &Store {
        &self.store
    }

    fn resolve(&self, path: &str) -> StatePath {
        self.base.join(&StatePath::parse(path))
    }

    /// Reads `path` relative to the base (`""` for the base itself).
    pub fn get(&self, path: &str) -> Option<Value> {
        self.store.get_at(&self.resolve(path))
    }

    pub fn get_or(&self, path: &str, default: Value) -> Value {
        self.get(path).unwrap_or(default)
    }

    pub fn set(&self, path: &str, value: impl Into<Value>) -> &Self {
        self.store.set_at(&self.resolve(path), value.into());
        self
    }

    pub fn delete(&self, path: &str) -> &Self {
        self.store.delete_at(&self.resolve(path));
        self
    }

    pub fn subscribe<F>(&self, path: &str, listener: F) -> Subscription
    where
        F: Fn(&Change) + Send + Sync + 'static,
    {
        self.store.subscribe(&self.resolve(path).to_dotted(), listener)
    }

    /// Narrows this view further.
    pub fn scope(&self, path: &str) -> ScopedStore {
        ScopedStore::new(self.store.clone(), self.resolve(path))
    }
}
