//! Snapshot storage
//!
//! One pretty-printed JSON file per identifier, named `<id>.json`. Snapshots
//! are written once by the harvest engine and treated as immutable
//! afterwards; nothing in this crate overwrites or mutates an existing
//! snapshot unless the file is deleted manually first.

use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Store of per-identifier JSON snapshots inside one `items/` folder
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Create a store over the given snapshot folder
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// Snapshot folder path
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the snapshot file for an identifier
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Whether a snapshot exists for the identifier
    pub fn exists(&self, id: &str) -> bool {
        self.path_for(id).exists()
    }

    /// Write a snapshot for the identifier, pretty-printed, wholesale.
    pub fn write(&self, id: &str, document: &Value) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(document)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let path = self.path_for(id);
        std::fs::write(&path, json)
            .map_err(|e| StoreError::Io(format!("Failed to write {}: {e}", path.display())))?;
        debug!(id = %id, path = %path.display(), "Snapshot written");
        Ok(())
    }

    /// Read and parse the snapshot for an identifier.
    ///
    /// An empty file is reported as a parse error so callers can skip it
    /// with a warning rather than fail the whole batch.
    pub fn read(&self, id: &str) -> StoreResult<Value> {
        let path = self.path_for(id);
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| StoreError::Io(format!("Failed to read {}: {e}", path.display())))?;
        if contents.trim().is_empty() {
            return Err(StoreError::Parse(format!(
                "Empty snapshot file: {}",
                path.display()
            )));
        }
        serde_json::from_str(&contents).map_err(|e| {
            StoreError::Parse(format!("Invalid JSON in {}: {e}", path.display()))
        })
    }

    /// List identifiers that have a snapshot on disk, sorted.
    pub fn list_ids(&self) -> StoreResult<Vec<String>> {
        let entries = std::fs::read_dir(&self.dir)
            .map_err(|e| StoreError::Io(format!("Failed to list {}: {e}", self.dir.display())))?;

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::Io(e.to_string()))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(id) = name.strip_suffix(".json") {
                ids.push(id.to_string());
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Snapshot store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// IO error
    #[error("IO error: {0}")]
    Io(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Snapshot contents are empty or not valid JSON
    #[error("parse error: {0}")]
    Parse(String),
}
