//! Binding table loaders
//!
//! The dispatcher asks its loader for a fresh snapshot on every key event;
//! nothing is cached, so edits to the mappings file apply to the next keystroke.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

use super::mappings::MappingTable;

/// Source of the binding table
#[async_trait(?Send)]
pub trait ConfigLoader {
    /// Fetch and parse the table. Any error means "engine off for this event".
    async fn load(&self) -> Result<MappingTable>;
}

/// Reads a mappings JSON file from disk
#[derive(Debug, Clone)]
pub struct FileConfigLoader {
    path: PathBuf,
}

impl FileConfigLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loader for `<config dir>/page-hotkeys/mappings.json`
    pub fn default_location() -> Self {
        Self::new(super::mappings_path())
    }
}

#[async_trait(?Send)]
impl ConfigLoader for FileConfigLoader {
    async fn load(&self) -> Result<MappingTable> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read mappings from {:?}", self.path))?;
        let table = MappingTable::from_json(&contents)
            .with_context(|| format!("Failed to parse mappings from {:?}", self.path))?;
        debug!(path = ?self.path, bindings = table.len(), "Loaded mappings");
        Ok(table)
    }
}

/// Table bundled with the program as JSON text
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    json: String,
}

impl StaticConfigLoader {
    pub fn new(json: impl Into<String>) -> Self {
        Self { json: json.into() }
    }
}

#[async_trait(?Send)]
impl ConfigLoader for StaticConfigLoader {
    async fn load(&self) -> Result<MappingTable> {
        MappingTable::from_json(&self.json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MAPPINGS: &str = r##"{"mappings": [
        {"url": "developer.mo", "key": {"char": "f", "shiftKey": true},
         "action": {"type": "click", "selector": "#try_it > a"}}
    ]}"##;

    #[tokio::test]
    async fn test_file_loader_reads_fresh_contents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MAPPINGS.as_bytes()).unwrap();
        let loader = FileConfigLoader::new(file.path());

        assert_eq!(loader.load().await.unwrap().len(), 1);

        // Rewritten file is picked up by the next load
        std::fs::write(file.path(), r#"{"mappings": []}"#).unwrap();
        assert!(loader.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_loader_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let loader = FileConfigLoader::new(dir.path().join("missing.json"));
        assert!(loader.load().await.is_err());
    }

    #[tokio::test]
    async fn test_file_loader_malformed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"not json").unwrap();
        let loader = FileConfigLoader::new(file.path());
        assert!(loader.load().await.is_err());
    }

    #[tokio::test]
    async fn test_static_loader() {
        let table = StaticConfigLoader::new(MAPPINGS).load().await.unwrap();
        assert_eq!(table.bindings()[0].binding.url, "developer.mo");
    }
}
