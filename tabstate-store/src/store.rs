//! The reactive state tree.

use crate::computed::{ComputedBinding, ComputedGraph};
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::history::History;
use crate::scope::ScopedStore;
use crate::subscription::{Change, Listener, SubscriberRegistry, Subscription};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tabstate_types::{StatePath, WILDCARD};
use tracing::{debug, error};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct TreeState {
    tree: Value,
    history: History,
}

impl TreeState {
    fn record(&mut self) {
        self.history.push(self.tree.clone());
    }
}

pub(crate) struct StoreInner {
    state: Mutex<TreeState>,
    subscribers: Mutex<SubscriberRegistry>,
    computed: Mutex<ComputedGraph>,
    config: StoreConfig,
}

impl StoreInner {
    pub(crate) fn subscribers(&self) -> MutexGuard<'_, SubscriberRegistry> {
        lock(&self.subscribers)
    }

    pub(crate) fn computed_graph(&self) -> MutexGuard<'_, ComputedGraph> {
        lock(&self.computed)
    }
}

/// Single source of truth for application state.
///
/// The tree is a JSON value addressed by dot-separated paths. Every read
/// returns an independent copy and every write takes ownership of its value,
/// so callers can never alias the tree. Each successful write records a
/// whole-tree snapshot in a bounded history ring and then notifies, in order:
///
/// 1. listeners on exactly the written path,
/// 2. wildcard (`"*"`) listeners,
/// 3. listeners on each ancestor, nearest first, excluding the root; these
///    receive the ancestor's current value and no old value.
///
/// Within each group listeners run in registration order. A panicking
/// listener is logged and skipped; the rest still run. Notification happens
/// after the write has committed and with no lock held, so listeners may
/// read and write the store.
///
/// Cloning yields another handle to the same tree.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

/// Non-owning handle to a [`Store`], used by listeners that write back.
#[derive(Clone)]
pub struct WeakStore {
    inner: Weak<StoreInner>,
}

impl WeakStore {
    /// Returns the store if it is still alive.
    pub fn upgrade(&self) -> Option<Store> {
        self.inner.upgrade().map(|inner| Store { inner })
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.inner.state);
        f.debug_struct("Store")
            .field("tree", &state.tree)
            .field("history", &state.history.len())
            .finish()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(Value::Object(Map::new()))
    }
}

impl Store {
    /// Creates a store holding `initial`, recorded as the first snapshot.
    pub fn new(initial: Value) -> Self {
        Self::with_config(initial, StoreConfig::default())
    }

    pub fn with_config(initial: Value, config: StoreConfig) -> Self {
        let mut history = History::new(config.max_history);
        history.push(initial.clone());
        Self {
            inner: Arc::new(StoreInner {
                state: Mutex::new(TreeState {
                    tree: initial,
                    history,
                }),
                subscribers: Mutex::new(SubscriberRegistry::default()),
                computed: Mutex::new(ComputedGraph::default()),
                config,
            }),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    pub fn downgrade(&self) -> WeakStore {
        WeakStore {
            inner: Arc::downgrade(&self.inner),
        }
    }

    // ── Reads ──────────────────────────────────────────────────────

    /// Returns a copy of the value at `path` (`""` for the whole tree), or
    /// `None` if any segment is missing.
    pub fn get(&self, path: &str) -> Option<Value> {
        self.get_at(&StatePath::parse(path))
    }

    /// Returns a copy of the value at `path`, or `default` when missing.
    pub fn get_or(&self, path: &str, default: Value) -> Value {
        self.get(path).unwrap_or(default)
    }

    /// Returns the value at `path` converted to `T`. Missing or mistyped
    /// values read as `None`.
    pub fn get_as<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        serde_json::from_value(self.get(path)?).ok()
    }

    /// A copy of the whole tree.
    pub fn snapshot(&self) -> Value {
        lock(&self.inner.state).tree.clone()
    }

    pub(crate) fn get_at(&self, path: &StatePath) -> Option<Value> {
        path.lookup(&lock(&self.inner.state).tree).cloned()
    }

    // ── Writes ─────────────────────────────────────────────────────

    /// Writes `value` at `path`, creating intermediate mappings as needed.
    ///
    /// Intermediates that exist but are neither mappings nor sequences are
    /// replaced. A numeric segment on a sequence indexes it, growing it with
    /// `null` padding when past the end. The store does not validate the
    /// shape of `value`.
    pub fn set(&self, path: &str, value: impl Into<Value>) -> &Self {
        self.set_at(&StatePath::parse(path), value.into());
        self
    }

    /// Serializes `value` and writes it at `path`.
    pub fn set_serialized<T: Serialize + ?Sized>(&self, path: &str, value: &T) -> StoreResult<&Self> {
        let value = serde_json::to_value(value)?;
        Ok(self.set(path, value))
    }

    pub(crate) fn set_at(&self, path: &StatePath, value: Value) {
        let (new_value, old_value) = {
            let mut state = lock(&self.inner.state);
            let new_value = value.clone();
            let old_value = path.assign(&mut state.tree, value);
            state.record();
            (new_value, old_value)
        };
        self.notify(path, Some(new_value), old_value);
    }

    /// Applies `set` once per entry, in order. Every entry records its own
    /// snapshot and sends its own notifications.
    pub fn update<I, K>(&self, entries: I) -> &Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        for (path, value) in entries {
            self.set(path.as_ref(), value);
        }
        self
    }

    /// Applies every entry, records one snapshot, then notifies for each
    /// entry in order.
    pub fn update_batched<I, K>(&self, entries: I) -> &Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let applied: Vec<(StatePath, Value, Option<Value>)> = {
            let mut state = lock(&self.inner.state);
            let applied = entries
                .into_iter()
                .map(|(path, value)| {
                    let path = StatePath::parse(path.as_ref());
                    let old_value = path.assign(&mut state.tree, value.clone());
                    (path, value, old_value)
                })
                .collect::<Vec<_>>();
            if !applied.is_empty() {
                state.record();
            }
            applied
        };
        for (path, new_value, old_value) in applied {
            self.notify(&path, Some(new_value), old_value);
        }
        self
    }

    /// Removes the leaf at `path`.
    ///
    /// A sequence element is replaced by `null` rather than shifting the
    /// elements after it. If the parent does not resolve to an existing
    /// mapping or sequence this does nothing: no snapshot, no notification.
    pub fn delete(&self, path: &str) -> &Self {
        self.delete_at(&StatePath::parse(path));
        self
    }

    pub(crate) fn delete_at(&self, path: &StatePath) {
        let old_value = {
            let mut state = lock(&self.inner.state);
            let parent_exists = path
                .parent()
                .and_then(|parent| parent.lookup(&state.tree))
                .is_some_and(|parent| parent.is_object() || parent.is_array());
            if !parent_exists {
                return;
            }
            let old_value = path.remove_from(&mut state.tree);
            state.record();
            old_value
        };
        self.notify(path, None, old_value);
    }

    // ── History ────────────────────────────────────────────────────

    /// Number of snapshots currently retained.
    pub fn history_len(&self) -> usize {
        lock(&self.inner.state).history.len()
    }

    /// Returns true if [`undo`](Self::undo) would do something.
    pub fn can_undo(&self) -> bool {
        self.history_len() > 1
    }

    /// Restores the previous snapshot. Returns false (and changes nothing)
    /// when only the initial snapshot remains.
    ///
    /// Only wildcard listeners are notified, with the restored tree.
    pub fn undo(&self) -> bool {
        let (restored, previous) = {
            let mut state = lock(&self.inner.state);
            let Some(restored) = state.history.step_back() else {
                return false;
            };
            let previous = std::mem::replace(&mut state.tree, restored.clone());
            (restored, previous)
        };
        debug!(history = self.history_len(), "undo");
        self.notify_restore(restored, previous);
        true
    }

    /// Restores the first snapshot ever recorded and collapses history to
    /// that single entry. Wildcard listeners are notified.
    pub fn reset(&self) {
        let (restored, previous) = {
            let mut state = lock(&self.inner.state);
            let Some(restored) = state.history.rewind() else {
                return;
            };
            let previous = std::mem::replace(&mut state.tree, restored.clone());
            (restored, previous)
        };
        debug!("reset to initial snapshot");
        self.notify_restore(restored, previous);
    }

    // ── Subscriptions ──────────────────────────────────────────────

    /// Registers `listener` for changes at `path`, beneath it, or (with
    /// `"*"`) anywhere.
    pub fn subscribe<F>(&self, path: &str, listener: F) -> Subscription
    where
        F: Fn(&Change) + Send + Sync + 'static,
    {
        let key = subscription_key(path);
        let id = self.inner.subscribers().add(&key, Arc::new(listener));
        Subscription {
            path: key,
            id,
            store: Arc::downgrade(&self.inner),
        }
    }

    /// Registers `listener` for every change.
    pub fn on_any_change<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Change) + Send + Sync + 'static,
    {
        self.subscribe(WILDCARD, listener)
    }

    /// Removes every listener registered on `path`.
    pub fn clear_subscribers(&self, path: &str) {
        self.inner.subscribers().clear(&subscription_key(path));
    }

    /// Number of listeners registered on exactly `path`.
    pub fn subscriber_count(&self, path: &str) -> usize {
        self.inner.subscribers().count(&subscription_key(path))
    }

    // ── Derived values ─────────────────────────────────────────────

    /// Writes `compute(values at dependencies)` to `path` now and again
    /// whenever a dependency (or anything beneath it) changes.
    ///
    /// Registration fails with [`StoreError::ComputedCycle`] if the value
    /// would feed back into its own dependencies, directly or through other
    /// computed values, and with [`StoreError::InvalidDependency`] for the
    /// wildcard.
    pub fn computed<F>(
        &self,
        path: &str,
        dependencies: &[&str],
        compute: F,
    ) -> StoreResult<ComputedBinding>
    where
        F: Fn(&[Option<Value>]) -> Value + Send + Sync + 'static,
    {
        if let Some(bad) = dependencies.iter().find(|d| d.trim() == WILDCARD) {
            return Err(StoreError::InvalidDependency((*bad).to_string()));
        }

        let target = StatePath::parse(path);
        let deps: Vec<StatePath> = dependencies.iter().map(|d| StatePath::parse(d)).collect();
        let id = self
            .inner
            .computed_graph()
            .try_insert(target.clone(), deps.clone())
            .ok_or_else(|| StoreError::ComputedCycle {
                path: target.to_dotted(),
            })?;

        let weak = self.downgrade();
        let recompute: Arc<dyn Fn() + Send + Sync> = {
            let target = target.clone();
            let deps = deps.clone();
            Arc::new(move || {
                let Some(store) = weak.upgrade() else {
                    return;
                };
                let values: Vec<Option<Value>> = deps.iter().map(|d| store.get_at(d)).collect();
                store.set_at(&target, compute(&values));
            })
        };

        recompute();

        let subscriptions = deps
            .iter()
            .map(|dep| {
                let recompute = Arc::clone(&recompute);
                self.subscribe(&dep.to_dotted(), move |_| recompute())
            })
            .collect();

        debug!(path = %target, dependencies = deps.len(), "registered computed value");
        Ok(ComputedBinding {
            id,
            path: target.to_dotted(),
            subscriptions,
            store: Arc::downgrade(&self.inner),
        })
    }

    /// Number of live computed values.
    pub fn computed_count(&self) -> usize {
        self.inner.computed_graph().len()
    }

    // ── Scopes ─────────────────────────────────────────────────────

    /// A view whose paths are relative to `base`. Writes through the view
    /// are visible here and vice versa.
    pub fn scope(&self, base: &str) -> ScopedStore {
        ScopedStore::new(self.clone(), StatePath::parse(base))
    }

    // ── Notification ───────────────────────────────────────────────

    fn notify(&self, path: &StatePath, new_value: Option<Value>, old_value: Option<Value>) {
        let source = path.to_dotted();
        let change = Change {
            path: source.clone(),
            source: source.clone(),
            new_value,
            old_value,
        };

        self.invoke(&source, &change);
        if source != WILDCARD {
            self.invoke(WILDCARD, &change);
        }

        for ancestor in path.ancestors() {
            let key = ancestor.to_dotted();
            if self.inner.subscribers().count(&key) == 0 {
                continue;
            }
            let change = Change {
                path: key.clone(),
                source: source.clone(),
                new_value: self.get_at(&ancestor),
                old_value: None,
            };
            self.invoke(&key, &change);
        }
    }

    fn notify_restore(&self, restored: Value, previous: Value) {
        let change = Change {
            path: String::new(),
            source: String::new(),
            new_value: Some(restored),
            old_value: Some(previous),
        };
        self.invoke(WILDCARD, &change);
    }

    fn invoke(&self, key: &str, change: &Change) {
        let listeners: Vec<Listener> = self.inner.subscribers().listeners(key);
        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(change))).is_err() {
                error!(path = %key, source = %change.source, "store listener panicked");
            }
        }
    }
}

fn subscription_key(path: &str) -> String {
    if path.trim() == WILDCARD {
        WILDCARD.to_string()
    } else {
        StatePath::parse(path).to_dotted()
    }
}
