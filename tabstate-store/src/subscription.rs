//! Change payloads and the subscriber registry.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::store::StoreInner;

/// Callback invoked when a subscribed path changes.
pub type Listener = Arc<dyn Fn(&Change) + Send + Sync>;

/// What a listener is told about a mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    /// Path whose value `new_value` holds. For exact and wildcard listeners
    /// this is the mutated path; for ancestor listeners it is the ancestor.
    pub path: String,
    /// Path that was actually mutated (`""` for whole-tree restores).
    pub source: String,
    /// Value now at `path`, or `None` if it was deleted.
    pub new_value: Option<Value>,
    /// Value previously at `path`. Always `None` for ancestor listeners,
    /// which only learn that something beneath them changed.
    pub old_value: Option<Value>,
}

impl Change {
    /// Returns true when this notification is for an ancestor of the
    /// mutated path.
    pub fn is_ancestor_notification(&self) -> bool {
        self.path != self.source
    }
}

#[derive(Default)]
pub(crate) struct SubscriberRegistry {
    next_id: u64,
    by_path: HashMap<String, Vec<(u64, Listener)>>,
}

impl SubscriberRegistry {
    pub(crate) fn add(&mut self, path: &str, listener: Listener) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.by_path
            .entry(path.to_string())
            .or_default()
            .push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, path: &str, id: u64) {
        if let Some(listeners) = self.by_path.get_mut(path) {
            listeners.retain(|(existing, _)| *existing != id);
            if listeners.is_empty() {
                self.by_path.remove(path);
            }
        }
    }

    pub(crate) fn clear(&mut self, path: &str) {
        self.by_path.remove(path);
    }

    /// Listeners on `path` in registration order.
    pub(crate) fn listeners(&self, path: &str) -> Vec<Listener> {
        self.by_path
            .get(path)
            .map(|l| l.iter().map(|(_, f)| Arc::clone(f)).collect())
            .unwrap_or_default()
    }

    pub(crate) fn count(&self, path: &str) -> usize {
        self.by_path.get(path).map_or(0, Vec::len)
    }
}

/// Handle returned by [`Store::subscribe`](crate::Store::subscribe).
///
/// Dropping the handle leaves the listener registered; call
/// [`unsubscribe`](Self::unsubscribe) to remove it.
pub struct Subscription {
    pub(crate) path: String,
    pub(crate) id: u64,
    pub(crate) store: Weak<StoreInner>,
}

impl Subscription {
    /// The subscription key (a dotted path or `"*"`).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Removes the listener. Calling this more than once is harmless.
    pub fn unsubscribe(&self) {
        if let Some(store) = self.store.upgrade() {
            store.subscribers().remove(&self.path, self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("path", &self.path)
            .field("id", &self.id)
            .finish()
    }
}
