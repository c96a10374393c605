//! Application configuration.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tabstate_storage::StorageConfig;
use tabstate_store::StoreConfig;

/// Configuration for an [`AppStore`](crate::AppStore).
///
/// Every field has a default, so a config file only needs the fields it
/// overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub store: StoreConfig,
    /// Subtrees written to storage whenever they change. Each is stored
    /// under its own dotted path as the key.
    pub persisted_paths: Vec<String>,
    /// Subtrees loaded from storage at start-up but not written back.
    pub hydrated_paths: Vec<String>,
    /// Apply changes to persisted and hydrated keys made by other contexts.
    pub follow_remote: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            store: StoreConfig::default(),
            persisted_paths: vec!["settings".to_string()],
            hydrated_paths: vec!["user".to_string()],
            follow_remote: true,
        }
    }
}

impl AppConfig {
    /// Loads a config from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| AppError::Config(format!("{}: {e}", path.display())))
    }

    /// Paths whose storage keys are followed across contexts, without
    /// duplicates, persisted paths first.
    pub fn followed_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = Vec::new();
        for path in self.persisted_paths.iter().chain(&self.hydrated_paths) {
            if !paths.contains(&path.as_str()) {
                paths.push(path.as_str());
            }
        }
        paths
    }
}
