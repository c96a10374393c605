//! Namespaced, expiring key-value storage over a shared [`Medium`].

use crate::bus::{ChangeBus, StorageEvent};
use crate::config::StorageConfig;
use crate::error::{StorageError, StorageResult};
use crate::medium::{Medium, MemoryMedium};
use crate::session::SessionStorage;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tabstate_codec::{DurableEntry, decode_with, encode_with};
use tabstate_types::{ContextId, SharedClock, SystemClock};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, error, warn};

/// Callback invoked with the new value of a key, or `None` on removal.
pub type ChangeListener = Arc<dyn Fn(Option<&Value>) + Send + Sync>;

/// Options for [`Storage::set_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Entry becomes unreadable this long after the write.
    pub expires_in: Option<Duration>,
    /// Pass the envelope through the reversible obfuscation transform.
    /// This is not encryption.
    pub obfuscate: bool,
}

impl WriteOptions {
    /// Options expiring the entry after `duration`.
    pub fn expires_in(duration: Duration) -> Self {
        Self {
            expires_in: Some(duration),
            ..Self::default()
        }
    }

    /// Options obfuscating the stored envelope.
    pub fn obfuscated() -> Self {
        Self {
            obfuscate: true,
            ..Self::default()
        }
    }

    /// Adds obfuscation to these options.
    pub fn with_obfuscation(mut self) -> Self {
        self.obfuscate = true;
        self
    }
}

/// Options for [`Storage::get_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Reverse obfuscation before decoding.
    pub obfuscated: bool,
}

#[derive(Default)]
struct ListenerRegistry {
    next_id: u64,
    by_key: HashMap<String, Vec<(u64, ChangeListener)>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle returned by [`Storage::on_change`].
///
/// Dropping the handle keeps the listener registered; call
/// [`unsubscribe`](Self::unsubscribe) to remove it.
pub struct ChangeSubscription {
    key: String,
    id: u64,
    registry: Weak<Mutex<ListenerRegistry>>,
}

impl fmt::Debug for ChangeSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeSubscription")
            .field("key", &self.key)
            .field("id", &self.id)
            .finish()
    }
}

impl ChangeSubscription {
    /// Removes the listener. Calling this more than once is harmless.
    pub fn unsubscribe(&self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut registry = lock(&registry);
        if let Some(listeners) = registry.by_key.get_mut(&self.key) {
            listeners.retain(|(id, _)| *id != self.id);
            if listeners.is_empty() {
                registry.by_key.remove(&self.key);
            }
        }
    }
}

/// Fluent builder for [`Storage`].
pub struct StorageBuilder {
    medium: Arc<dyn Medium>,
    config: StorageConfig,
    bus: Option<ChangeBus>,
    clock: SharedClock,
}

impl StorageBuilder {
    pub fn new(medium: Arc<dyn Medium>) -> Self {
        Self {
            medium,
            config: StorageConfig::default(),
            bus: None,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn config(mut self, config: StorageConfig) -> Self {
        self.config = config;
        self
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.namespace = namespace.into();
        self
    }

    /// Attaches this context to a bus shared with other contexts.
    pub fn bus(mut self, bus: &ChangeBus) -> Self {
        self.bus = Some(bus.clone());
        self
    }

    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> Storage {
        let receiver = self.bus.as_ref().map(ChangeBus::subscribe);
        let session = SessionStorage::new(self.config.session_namespace());
        Storage {
            inner: Arc::new(Inner {
                medium: self.medium,
                config: self.config,
                clock: self.clock,
                context: ContextId::new(),
                bus: self.bus,
                receiver: Mutex::new(receiver),
                listeners: Arc::new(Mutex::new(ListenerRegistry::default())),
                session,
            }),
        }
    }
}

struct Inner {
    medium: Arc<dyn Medium>,
    config: StorageConfig,
    clock: SharedClock,
    context: ContextId,
    bus: Option<ChangeBus>,
    receiver: Mutex<Option<broadcast::Receiver<StorageEvent>>>,
    listeners: Arc<Mutex<ListenerRegistry>>,
    session: SessionStorage,
}

/// Durable key-value storage for one execution context.
///
/// Every logical key is stored on the medium under the configured namespace
/// prefix, wrapped in a [`DurableEntry`]. Expired entries are deleted lazily
/// when read. Writes and removals are published on the [`ChangeBus`] (if
/// attached) so other contexts sharing the medium can follow along.
///
/// Concurrent writers to the same key are last-write-wins; there is no
/// locking or conflict detection across contexts.
///
/// Cloning yields another handle to the same context.
#[derive(Clone)]
pub struct Storage {
    inner: Arc<Inner>,
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Storage")
            .field("namespace", &self.inner.config.namespace)
            .field("context", &self.inner.context)
            .field("attached", &self.inner.bus.is_some())
            .finish()
    }
}

impl Storage {
    /// Starts building a storage handle over `medium`.
    pub fn builder(medium: Arc<dyn Medium>) -> StorageBuilder {
        StorageBuilder::new(medium)
    }

    /// A standalone handle over a fresh in-memory medium.
    pub fn in_memory() -> Self {
        StorageBuilder::new(Arc::new(MemoryMedium::new())).build()
    }

    /// This handle's execution context.
    pub fn context(&self) -> ContextId {
        self.inner.context
    }

    pub fn config(&self) -> &StorageConfig {
        &self.inner.config
    }

    /// The medium key a logical key is stored under.
    pub fn namespaced_key(&self, key: &str) -> String {
        format!("{}{}", self.inner.config.namespace, key)
    }

    // ── Writes ─────────────────────────────────────────────────────

    /// Stores `value` under `key` with no expiry.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StorageResult<()> {
        self.set_with(key, value, WriteOptions::default())
    }

    /// Stores `value` under `key`.
    ///
    /// A full medium is reported as [`StorageError::QuotaExceeded`]; nothing
    /// is published in that case.
    pub fn set_with<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        options: WriteOptions,
    ) -> StorageResult<()> {
        let value = serde_json::to_value(value)?;
        let entry = DurableEntry::new(value, self.inner.clock.now(), options.expires_in);
        let raw = encode_with(&entry, options.obfuscate)?;
        let physical = self.namespaced_key(key);

        if let Err(e) = self.inner.medium.set_item(&physical, &raw) {
            if matches!(e, StorageError::QuotaExceeded { .. }) {
                warn!(key, error = %e, "storage write rejected");
            }
            return Err(e);
        }

        self.publish(physical, Some(raw));
        Ok(())
    }

    /// Deletes `key` and publishes the removal.
    pub fn remove(&self, key: &str) {
        let physical = self.namespaced_key(key);
        self.inner.medium.remove_item(&physical);
        self.publish(physical, None);
    }

    /// Deletes every key in this namespace. Other namespaces on the same
    /// medium are untouched. No change events are published.
    pub fn clear(&self) {
        for physical in self.physical_keys() {
            self.inner.medium.remove_item(&physical);
        }
    }

    /// Deletes every expired entry in this namespace, returning how many were
    /// removed. Only runs when called.
    pub fn purge_expired(&self) -> usize {
        let now = self.inner.clock.now();
        let mut purged = 0;
        for physical in self.physical_keys() {
            let Some(raw) = self.inner.medium.get_item(&physical) else {
                continue;
            };
            if decode_with(&raw, true).is_ok_and(|entry| entry.is_expired(now)) {
                self.inner.medium.remove_item(&physical);
                purged += 1;
            }
        }
        debug!(purged, "purged expired entries");
        purged
    }

    // ── Reads ──────────────────────────────────────────────────────

    /// Reads `key`. Missing, expired, corrupt or mistyped entries read as
    /// `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get_with(key, ReadOptions::default())
    }

    /// Reads `key`, falling back to `default`.
    pub fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Reads `key` as a raw JSON value.
    pub fn get_value(&self, key: &str) -> Option<Value> {
        self.read_entry(key, false)
    }

    /// Reads `key` with explicit options.
    pub fn get_with<T: DeserializeOwned>(&self, key: &str, options: ReadOptions) -> Option<T> {
        let value = self.read_entry(key, options.obfuscated)?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                warn!(key, error = %e, "stored value has unexpected shape");
                None
            }
        }
    }

    fn read_entry(&self, key: &str, obfuscated: bool) -> Option<Value> {
        let physical = self.namespaced_key(key);
        let raw = self.inner.medium.get_item(&physical)?;

        let entry = match decode_with(&raw, obfuscated) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, error = %e, "unreadable storage entry");
                return None;
            }
        };

        if entry.is_expired(self.inner.clock.now()) {
            debug!(key, "entry expired; removing");
            self.inner.medium.remove_item(&physical);
            return None;
        }
        Some(entry.value)
    }

    /// Returns true if `key` is present on the medium, expired or not.
    pub fn has(&self, key: &str) -> bool {
        self.inner
            .medium
            .get_item(&self.namespaced_key(key))
            .is_some()
    }

    /// Logical keys present in this namespace, expired or not.
    pub fn keys(&self) -> Vec<String> {
        let namespace = &self.inner.config.namespace;
        self.physical_keys()
            .into_iter()
            .filter_map(|k| k.strip_prefix(namespace.as_str()).map(str::to_string))
            .collect()
    }

    /// Approximate bytes used by this namespace (keys plus stored strings).
    pub fn size(&self) -> usize {
        self.physical_keys()
            .into_iter()
            .map(|k| {
                let stored = self.inner.medium.get_item(&k).map_or(0, |v| v.len());
                k.len() + stored
            })
            .sum()
    }

    fn physical_keys(&self) -> Vec<String> {
        self.inner
            .medium
            .keys()
            .into_iter()
            .filter(|k| k.starts_with(&self.inner.config.namespace))
            .collect()
    }

    /// Session-scoped storage for this context.
    pub fn session(&self) -> &SessionStorage {
        &self.inner.session
    }

    // ── Change notification ────────────────────────────────────────

    /// Registers `listener` for changes to `key`.
    ///
    /// Writes from other contexts reach the listener when this context calls
    /// [`dispatch_pending`](Self::dispatch_pending). This context's own writes
    /// reach it immediately when `notify_self` is enabled.
    pub fn on_change<F>(&self, key: &str, listener: F) -> ChangeSubscription
    where
        F: Fn(Option<&Value>) + Send + Sync + 'static,
    {
        let physical = self.namespaced_key(key);
        let mut registry = lock(&self.inner.listeners);
        registry.next_id += 1;
        let id = registry.next_id;
        registry
            .by_key
            .entry(physical.clone())
            .or_default()
            .push((id, Arc::new(listener)));

        ChangeSubscription {
            key: physical,
            id,
            registry: Arc::downgrade(&self.inner.listeners),
        }
    }

    /// Delivers every change published by other contexts since the last
    /// call. Returns the number of foreign events processed.
    pub fn dispatch_pending(&self) -> usize {
        let mut processed = 0;
        loop {
            let next = {
                let mut receiver = lock(&self.inner.receiver);
                match receiver.as_mut() {
                    Some(rx) => rx.try_recv(),
                    None => return processed,
                }
            };
            match next {
                Ok(event) if event.context == self.inner.context => {}
                Ok(event) => {
                    processed += 1;
                    self.deliver(&event);
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "change bus lagged; events dropped");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return processed,
            }
        }
    }

    fn publish(&self, key: String, new_value: Option<String>) {
        let event = StorageEvent {
            key,
            new_value,
            origin: self.inner.config.origin.clone(),
            context: self.inner.context,
        };
        if self.inner.config.notify_self {
            self.deliver(&event);
        }
        if let Some(bus) = &self.inner.bus {
            bus.publish(event);
        }
    }

    fn deliver(&self, event: &StorageEvent) {
        let listeners: Vec<ChangeListener> = lock(&self.inner.listeners)
            .by_key
            .get(&event.key)
            .map(|l| l.iter().map(|(_, f)| Arc::clone(f)).collect())
            .unwrap_or_default();
        if listeners.is_empty() {
            return;
        }

        let value = match &event.new_value {
            None => None,
            Some(raw) => match decode_with(raw, true) {
                Ok(entry) => Some(entry.value),
                Err(e) => {
                    warn!(key = %event.key, error = %e, "dropping undecodable change event");
                    return;
                }
            },
        };

        for listener in listeners {
            if catch_unwind(AssertUnwindSafe(|| listener(value.as_ref()))).is_err() {
                error!(key = %event.key, "storage change listener panicked");
            }
        }
    }
}
