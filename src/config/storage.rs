//! Durable key-value storage behind the settings store
//!
//! Keys are `"<category>.<attribute>"` strings and values are JSON-encoded
//! scalars, the same layout a browser's local storage would hold.

use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while writing the persisted store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// A string-keyed store of string values that survives restarts.
pub trait KeyValueStore {
    /// Read the raw value stored under `key`, if any
    fn get_item(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Volatile store, used for tests and `--storage :memory:`
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON file holding one object of key -> encoded value.
///
/// Every write rewrites the whole file through a temporary sibling and a
/// rename, so a crash never leaves a half-written store behind.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    items: BTreeMap<String, String>,
}

impl FileStore {
    /// Default location under the user's local data directory
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("feedbeacon")
            .join("storage.json")
    }

    /// Open the store at `path`. A missing file is an empty store; a file
    /// that does not parse is logged and treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let items = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read storage file: {:?}", path))?;
            match serde_json::from_str::<BTreeMap<String, String>>(&content) {
                Ok(items) => {
                    tracing::info!("Loaded {} stored settings from {:?}", items.len(), path);
                    items
                }
                Err(e) => {
                    tracing::warn!("Ignoring unreadable storage file {:?}: {}", path, e);
                    BTreeMap::new()
                }
            }
        } else {
            tracing::info!("No storage file at {:?}, starting fresh", path);
            BTreeMap::new()
        };

        Ok(Self { path, items })
    }

    fn write(&self, items: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(items)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut next = self.items.clone();
        next.insert(key.to_string(), value.to_string());
        self.write(&next)?;
        self.items = next;
        Ok(())
    }
}

/// Either backend, picked at startup from the command line
#[derive(Debug)]
pub enum AnyStore {
    Memory(MemoryStore),
    File(FileStore),
}

impl KeyValueStore for AnyStore {
    fn get_item(&self, key: &str) -> Option<String> {
        match self {
            AnyStore::Memory(s) => s.get_item(key),
            AnyStore::File(s) => s.get_item(key),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        match self {
            AnyStore::Memory(s) => s.set_item(key, value),
            AnyStore::File(s) => s.set_item(key, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert!(store.get_item("beacon.active").is_none());
        store.set_item("beacon.active", "true").unwrap();
        assert_eq!(store.get_item("beacon.active").as_deref(), Some("true"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        let mut store = FileStore::open(&path).unwrap();
        store.set_item("beacon.interval", "2500").unwrap();
        assert!(path.exists());

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get_item("beacon.interval").as_deref(), Some("2500"));
    }

    #[test]
    fn test_file_store_ignores_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "{ this is not json").unwrap();

        let store = FileStore::open(&path).unwrap();
        assert!(store.get_item("beacon.active").is_none());
    }

    #[test]
    fn test_file_store_keeps_old_value_when_write_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let mut store = FileStore::open(&path).unwrap();
        store.set_item("beacon.interval", "2500").unwrap();

        // Parent of the store path becomes a regular file
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        store.path = blocker.join("storage.json");

        assert!(store.set_item("beacon.interval", "9000").is_err());
        assert_eq!(store.get_item("beacon.interval").as_deref(), Some("2500"));
    }
}
