//! The application's state instance.

use crate::config::AppConfig;
use crate::error::AppResult;
use serde_json::{Value, json};
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tabstate_storage::{ChangeSubscription, FileMedium, Storage};
use tabstate_store::{Store, Subscription};
use tabstate_types::StatePath;
use tracing::{debug, info};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The state tree every application module starts from.
pub fn default_state() -> Value {
    json!({
        "user": null,
        "balance": 0,
        "orders": [],
        "services": [],
        "settings": {
            "theme": "light",
            "currency": "USD",
            "notifications": true
        },
        "ui": {
            "loading": false,
            "sidebarOpen": false,
            "activeModal": null
        }
    })
}

#[derive(Default)]
struct Bindings {
    persisted: Vec<Subscription>,
    remote: Vec<ChangeSubscription>,
}

/// One process-wide state tree bound to one storage context.
///
/// Construct it once at the composition root and hand clones of
/// [`store`](Self::store) to the modules that need it. Persistence keeps
/// running until [`dispose`](Self::dispose) is called; dropping the instance
/// does not stop it.
pub struct AppStore {
    store: Store,
    storage: Storage,
    config: AppConfig,
    bindings: Mutex<Bindings>,
}

impl fmt::Debug for AppStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bindings = lock(&self.bindings);
        f.debug_struct("AppStore")
            .field("storage", &self.storage)
            .field("persisted", &bindings.persisted.len())
            .field("remote", &bindings.remote.len())
            .finish()
    }
}

impl AppStore {
    /// Builds the state tree and binds it to `storage`.
    ///
    /// The tree starts from [`default_state`]. Each hydrated path is replaced
    /// by its stored value when one exists. Each persisted path that is a
    /// mapping in both places has the stored fields merged over the defaults,
    /// so fields added in later releases keep their defaults. The result is
    /// the store's initial snapshot.
    pub fn init(storage: Storage, config: AppConfig) -> Self {
        let mut tree = default_state();
        for path in &config.hydrated_paths {
            if let Some(saved) = storage.get_value(path) {
                debug!(path = %path, "hydrated from storage");
                StatePath::parse(path).assign(&mut tree, saved);
            }
        }
        for path in &config.persisted_paths {
            if let Some(saved) = storage.get_value(path) {
                debug!(path = %path, "restored persisted state");
                merge_at(&mut tree, &StatePath::parse(path), saved);
            }
        }

        let store = Store::with_config(tree, config.store.clone());

        let persisted = config
            .persisted_paths
            .iter()
            .map(|path| store.persist_path(&storage, path, path))
            .collect();
        let remote = if config.follow_remote {
            config
                .followed_paths()
                .into_iter()
                .map(|path| store.follow_remote(&storage, path, path))
                .collect()
        } else {
            Vec::new()
        };

        info!(
            context = %storage.context(),
            persisted = config.persisted_paths.len(),
            follow_remote = config.follow_remote,
            "application state ready"
        );

        Self {
            store,
            storage,
            config,
            bindings: Mutex::new(Bindings { persisted, remote }),
        }
    }

    /// Opens state persisted in a JSON file.
    pub fn open(path: impl AsRef<Path>, config: AppConfig) -> AppResult<Self> {
        let medium = FileMedium::open(path)?;
        let storage = Storage::builder(Arc::new(medium))
            .config(config.storage.clone())
            .build();
        Ok(Self::init(storage, config))
    }

    /// State with in-memory storage, mainly for tests.
    pub fn in_memory(config: AppConfig) -> Self {
        let storage = Storage::builder(Arc::new(tabstate_storage::MemoryMedium::new()))
            .config(config.storage.clone())
            .build();
        Self::init(storage, config)
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Applies changes published by other contexts. Returns how many
    /// foreign events were processed.
    pub fn sync_remote(&self) -> usize {
        self.storage.dispatch_pending()
    }

    /// Writes the whole tree to storage under `key`.
    pub fn save_snapshot(&self, key: &str) -> AppResult<()> {
        self.store.save_snapshot(&self.storage, key)?;
        Ok(())
    }

    /// Stops persistence and remote following. The tree stays readable and
    /// writable. Calling this more than once is harmless.
    pub fn dispose(&self) {
        let bindings = std::mem::take(&mut *lock(&self.bindings));
        for subscription in &bindings.persisted {
            subscription.unsubscribe();
        }
        for subscription in &bindings.remote {
            subscription.unsubscribe();
        }
        debug!(
            persisted = bindings.persisted.len(),
            remote = bindings.remote.len(),
            "application state disposed"
        );
    }
}

fn merge_at(tree: &mut Value, path: &StatePath, saved: Value) {
    let merged = match (path.lookup(tree), saved) {
        (Some(Value::Object(defaults)), Value::Object(saved)) => {
            let mut merged = defaults.clone();
            merged.extend(saved);
            Value::Object(merged)
        }
        (_, saved) => saved,
    };
    path.assign(tree, merged);
}
