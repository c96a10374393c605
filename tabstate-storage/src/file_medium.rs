//! A medium persisted to a single JSON file.
//!
//! The whole map is held in memory and rewritten on every mutation. Writes go
//! to a sibling temporary file first and are then renamed over the target.

use crate::error::StorageResult;
use crate::medium::Medium;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// A [`Medium`] backed by a JSON object on disk.
#[derive(Debug)]
pub struct FileMedium {
    path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
}

impl FileMedium {
    /// Opens (or prepares to create) the file at `path`.
    ///
    /// A missing file starts empty. A file that cannot be parsed is an error
    /// so that it is never silently overwritten.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        let items = match std::fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), entries = items.len(), "opened file medium");
        Ok(Self {
            path,
            items: Mutex::new(items),
        })
    }

    /// The file backing this medium.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn flush(&self, items: &BTreeMap<String, String>) -> StorageResult<()> {
        let json = serde_json::to_string_pretty(items)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl Medium for FileMedium {
    fn get_item(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut items = self.lock();
        let previous = items.insert(key.to_string(), value.to_string());
        if let Err(e) = self.flush(&items) {
            match previous {
                Some(old) => items.insert(key.to_string(), old),
                None => items.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) {
        let mut items = self.lock();
        if items.remove(key).is_some() {
            if let Err(e) = self.flush(&items) {
                warn!(key, error = %e, "failed to persist removal");
            }
        }
    }

    fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }
}
