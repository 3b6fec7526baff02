//! Durable key-value storage for engine state
//!
//! The run flag is the only entry the engine writes. Values are strings;
//! callers decide the encoding (the run flag is a JSON boolean).

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Storage port scoped to this extension/user
#[async_trait(?Send)]
pub trait StateStorage {
    async fn read(&self, key: &str) -> Result<Option<String>>;
    async fn write(&self, key: &str, value: &str) -> Result<()>;
}

/// Process-local storage for tests and ephemeral runs
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-seeded with one entry
    pub fn with_entry(key: &str, value: &str) -> Self {
        let storage = Self::default();
        storage
            .entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        storage
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }
}

#[async_trait(?Send)]
impl StateStorage for MemoryStorage {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get(key))
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON object file holding all entries (`{"key": "value"}`)
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage at `<config dir>/page-hotkeys/state.json`
    pub fn default_location() -> Self {
        Self::new(crate::config::state_path())
    }

    fn load_entries(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read state from {:?}", self.path))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse state JSON from {:?}", self.path))
    }
}

#[async_trait(?Send)]
impl StateStorage for FileStorage {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load_entries()?.remove(key))
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.load_entries()?;
        entries.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create state directory {:?}", parent))?;
        }
        let json = serde_json::to_string_pretty(&entries).context("Failed to serialize state")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write state to {:?}", self.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_storage() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.read("k").await.unwrap(), None);
        storage.write("k", "true").await.unwrap();
        assert_eq!(storage.read("k").await.unwrap().as_deref(), Some("true"));
    }

    #[tokio::test]
    async fn test_file_storage_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("state.json");

        FileStorage::new(&path).write("a", "false").await.unwrap();
        FileStorage::new(&path).write("b", "1").await.unwrap();

        let reopened = FileStorage::new(&path);
        assert_eq!(reopened.read("a").await.unwrap().as_deref(), Some("false"));
        assert_eq!(reopened.read("b").await.unwrap().as_deref(), Some("1"));
        assert_eq!(reopened.read("c").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_storage_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "[oops").unwrap();
        assert!(FileStorage::new(&path).read("a").await.is_err());
    }
}
