//! Commands for the tabstate storage inspector.

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use serde_json::Value;
use std::{path::Path, sync::Arc, time::Duration};
use tabstate_storage::{FileMedium, ReadOptions, Storage, StorageConfig, WriteOptions};
use tracing::{debug, info};

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the value stored under a key
    Get {
        key: String,
        /// The entry was written obfuscated
        #[arg(long)]
        obfuscated: bool,
    },
    /// Store a value; input that is not valid JSON is stored as a string
    Set {
        key: String,
        value: String,
        /// Expire the entry after this many seconds
        #[arg(long)]
        expires_in: Option<u64>,
        /// Obfuscate the stored entry (not encryption)
        #[arg(long)]
        obfuscate: bool,
    },
    /// Delete a key
    Remove { key: String },
    /// List keys in the namespace
    Keys,
    /// Delete every key in the namespace
    Clear,
    /// Print approximate bytes used by the namespace
    Size,
    /// Delete expired entries
    Purge,
}

/// Opens file-backed storage under `namespace`.
pub fn open_storage(file: &Path, namespace: &str) -> Result<Storage> {
    let medium = FileMedium::open(file)
        .with_context(|| format!("failed to open {}", file.display()))?;
    debug!(file = %file.display(), namespace, "storage opened");
    Ok(Storage::builder(Arc::new(medium))
        .config(StorageConfig::with_namespace(namespace))
        .build())
}

/// Runs `command` against `storage`, returning the lines to print.
pub fn execute(storage: &Storage, command: Command) -> Result<Vec<String>> {
    let output = match command {
        Command::Get { key, obfuscated } => {
            let value: Value = storage
                .get_with(&key, ReadOptions { obfuscated })
                .with_context(|| format!("no readable entry for '{key}'"))?;
            vec![serde_json::to_string_pretty(&value)?]
        }
        Command::Set {
            key,
            value,
            expires_in,
            obfuscate,
        } => {
            let parsed: Value = serde_json::from_str(&value).unwrap_or(Value::String(value));
            let options = WriteOptions {
                expires_in: expires_in.map(Duration::from_secs),
                obfuscate,
            };
            storage
                .set_with(&key, &parsed, options)
                .with_context(|| format!("failed to write '{key}'"))?;
            info!(key = %key, "stored");
            Vec::new()
        }
        Command::Remove { key } => {
            if !storage.has(&key) {
                bail!("no entry for '{key}'");
            }
            storage.remove(&key);
            info!(key = %key, "removed");
            Vec::new()
        }
        Command::Keys => storage.keys(),
        Command::Clear => {
            let count = storage.keys().len();
            storage.clear();
            info!(count, "cleared namespace");
            Vec::new()
        }
        Command::Size => vec![storage.size().to_string()],
        Command::Purge => vec![storage.purge_expired().to_string()],
    };
    Ok(output)
}
