//! Identifier ledger persistence and reconciliation
//!
//! The ledger is a two-column CSV file (`ID,CACHED`) naming every identifier
//! an endpoint should hold and whether its snapshot has been fetched. The
//! filesystem is the ground truth: on every load the `CACHED` flag is
//! recomputed from snapshot-file presence and persisted back, so the ledger
//! self-heals after partial runs, crashes, or manual file deletion. The
//! persisted flag is a cache of that computation, never the source of truth.

use crate::store::SnapshotStore;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// One ledger row: an identifier and whether its snapshot is on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierRecord {
    /// Opaque identifier used by the API and as the snapshot filename
    #[serde(rename = "ID")]
    pub id: String,
    /// Whether a snapshot for this id exists (recomputed on load)
    #[serde(rename = "CACHED", deserialize_with = "deserialize_flag")]
    pub cached: bool,
}

/// Accepts `true`/`True`/`1` so ledgers written by other tooling still load.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        _ => Ok(false),
    }
}

/// Ordered set of identifier records for one endpoint.
///
/// The ledger is an explicit value flowing through the pipeline stages
/// (load, filter, commit); no stage keeps ambient ledger state.
#[derive(Debug, Clone)]
pub struct IdentifierLedger {
    records: Vec<IdentifierRecord>,
}

impl IdentifierLedger {
    /// Load the ledger, deduplicate by id (first occurrence wins), recompute
    /// every `cached` flag from snapshot presence, and persist the
    /// recomputed flags back to the same path.
    pub fn load(path: &Path, store: &SnapshotStore) -> LedgerResult<Self> {
        let mut records = read_records(path)?;

        let before = records.len();
        let mut seen = HashSet::new();
        records.retain(|r| seen.insert(r.id.clone()));
        if records.len() < before {
            debug!(
                dropped = before - records.len(),
                "Dropped duplicate ledger ids"
            );
        }

        for record in &mut records {
            record.cached = store.exists(&record.id);
        }

        let ledger = Self { records };
        ledger.persist(path)?;
        info!(
            path = %path.display(),
            total = ledger.records.len(),
            uncached = ledger.uncached_ids().len(),
            "Ledger loaded and reconciled against snapshot folder"
        );
        Ok(ledger)
    }

    /// All records, in ledger order
    pub fn records(&self) -> &[IdentifierRecord] {
        &self.records
    }

    /// Identifiers whose snapshot is not on disk, in ledger order
    pub fn uncached_ids(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| !r.cached)
            .map(|r| r.id.clone())
            .collect()
    }

    /// Drop records named in `exclude`, mark the remainder cached, persist.
    ///
    /// Excluded ids are the run's fetch failures; removing them keeps the
    /// ledger free of ids the provider rejected. An id marked cached here
    /// without a snapshot on disk is flipped back on the next [`load`],
    /// so optimistic marking cannot permanently hide missing data.
    ///
    /// [`load`]: IdentifierLedger::load
    pub fn commit(mut self, path: &Path, exclude: &HashSet<String>) -> LedgerResult<()> {
        self.records.retain(|r| !exclude.contains(&r.id));
        for record in &mut self.records {
            record.cached = true;
        }
        self.persist(path)?;
        info!(
            path = %path.display(),
            committed = self.records.len(),
            excluded = exclude.len(),
            "Ledger committed"
        );
        Ok(())
    }

    /// Append new identifiers to a ledger file as uncached, skipping ids
    /// already present. Returns how many were added.
    pub fn append(path: &Path, ids: &[String]) -> LedgerResult<usize> {
        let mut records = read_records(path)?;
        let mut known: HashSet<String> = records.iter().map(|r| r.id.clone()).collect();
        let mut added = 0;
        for id in ids {
            if known.insert(id.clone()) {
                records.push(IdentifierRecord {
                    id: id.clone(),
                    cached: false,
                });
                added += 1;
            }
        }

        let ledger = Self { records };
        ledger.persist(path)?;
        info!(path = %path.display(), added, "Appended discovered ids to ledger");
        Ok(added)
    }

    /// Atomically rewrite the ledger file.
    fn persist(&self, path: &Path) -> LedgerResult<()> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp = NamedTempFile::new_in(parent)
            .map_err(|e| LedgerError::Io(format!("Failed to create temp file: {e}")))?;

        {
            // Header is written explicitly so an empty ledger still carries it
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(&mut temp);
            writer
                .write_record(["ID", "CACHED"])
                .map_err(|e| LedgerError::Csv(e.to_string()))?;
            for record in &self.records {
                writer
                    .serialize(record)
                    .map_err(|e| LedgerError::Csv(e.to_string()))?;
            }
            writer
                .flush()
                .map_err(|e| LedgerError::Io(e.to_string()))?;
        }

        temp.flush()
            .map_err(|e| LedgerError::Io(format!("Failed to flush temp file: {e}")))?;
        temp.persist(path)
            .map_err(|e| LedgerError::Io(format!("Failed to persist ledger: {e}")))?;
        Ok(())
    }
}

/// Read raw records from a ledger file. A missing file yields an empty set.
fn read_records(path: &Path) -> LedgerResult<Vec<IdentifierRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| LedgerError::Io(format!("Failed to open {}: {e}", path.display())))?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        let record: IdentifierRecord = row.map_err(|e| LedgerError::Csv(e.to_string()))?;
        records.push(record);
    }
    Ok(records)
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger errors
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// IO error
    #[error("IO error: {0}")]
    Io(String),

    /// CSV read/write error
    #[error("CSV error: {0}")]
    Csv(String),
}
