//! Per-endpoint data folder layout
//!
//! Each endpoint owns a folder under the data directory:
//!
//! ```text
//! data/<endpoint>/
//!   ids.csv       identifier ledger (ID,CACHED)
//!   mapping.json  field -> JSON path mapping specification
//!   items/        one <id>.json snapshot per harvested identifier
//! ```

use std::path::{Path, PathBuf};
use tracing::info;

/// Ledger filename inside an endpoint folder
pub const LEDGER_FILE: &str = "ids.csv";

/// Mapping specification filename inside an endpoint folder
pub const MAPPING_FILE: &str = "mapping.json";

/// Snapshot folder name inside an endpoint folder
pub const ITEMS_DIR: &str = "items";

/// Header row seeded into a fresh ledger file
pub const LEDGER_HEADER: &str = "ID,CACHED";

/// Resolved paths for one endpoint's data folder
#[derive(Debug, Clone)]
pub struct EndpointLayout {
    /// Endpoint data folder (`data/<endpoint>`)
    pub data_path: PathBuf,
    /// Identifier ledger file
    pub ledger_path: PathBuf,
    /// Mapping specification file
    pub mapping_path: PathBuf,
    /// Snapshot folder
    pub items_dir: PathBuf,
}

impl EndpointLayout {
    /// Compute the layout for an endpoint under the given data directory
    pub fn new(data_dir: &Path, endpoint: &str) -> Self {
        let data_path = data_dir.join(endpoint);
        Self {
            ledger_path: data_path.join(LEDGER_FILE),
            mapping_path: data_path.join(MAPPING_FILE),
            items_dir: data_path.join(ITEMS_DIR),
            data_path,
        }
    }

    /// Create missing folders and seed an empty ledger if none exists.
    ///
    /// Returns `true` when a fresh ledger file was created.
    pub fn ensure(&self) -> Result<bool, LayoutError> {
        std::fs::create_dir_all(&self.items_dir)
            .map_err(|e| LayoutError::Io(format!("Failed to create items folder: {e}")))?;

        if self.ledger_path.exists() {
            return Ok(false);
        }

        std::fs::write(&self.ledger_path, format!("{LEDGER_HEADER}\n"))
            .map_err(|e| LayoutError::Io(format!("Failed to seed ledger file: {e}")))?;
        info!(
            path = %self.data_path.display(),
            "No data stored for endpoint yet, created folders and empty ledger"
        );
        Ok(true)
    }
}

/// Layout errors
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    /// IO error
    #[error("IO error: {0}")]
    Io(String),
}
