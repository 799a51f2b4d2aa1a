//! Snapshot parsing and CSV export
//!
//! Reads every cached snapshot for an endpoint, projects it through a
//! mapping specification, and writes the flattened records to one CSV
//! file. Unreadable or empty snapshots are skipped with a warning so a
//! partially corrupted cache never blocks an export.

use crate::mapper::{MapperError, MappingSpec};
use crate::store::{SnapshotStore, StoreError};
use csv::Writer;
use serde_json::Value;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::{debug, info, warn};

const DEFAULT_BUFFER_SIZE: usize = 8192; // 8KB buffer

/// Projects cached snapshots into flat records
pub struct SnapshotParser<'a> {
    store: &'a SnapshotStore,
    mapping: &'a MappingSpec,
}

impl<'a> SnapshotParser<'a> {
    /// Create a parser over a store and a mapping specification.
    pub fn new(store: &'a SnapshotStore, mapping: &'a MappingSpec) -> Self {
        Self { store, mapping }
    }

    /// Parse every cached snapshot, in identifier order.
    pub fn parse_all(&self) -> Result<Vec<Value>, ParserError> {
        self.parse_all_with(|record, _| record)
    }

    /// Parse every cached snapshot, letting `decorate` amend each mapped
    /// record with fields computed from the raw document.
    pub fn parse_all_with<F>(&self, mut decorate: F) -> Result<Vec<Value>, ParserError>
    where
        F: FnMut(Value, &Value) -> Value,
    {
        let ids = self.store.list_ids()?;
        info!(snapshots = ids.len(), "Parsing cached snapshots");

        let mut records = Vec::with_capacity(ids.len());
        let mut skipped = 0usize;
        for id in &ids {
            let document = match self.store.read(id) {
                Ok(doc) => doc,
                Err(e) => {
                    warn!(id = %id, error = %e, "Skipping unreadable snapshot");
                    skipped += 1;
                    continue;
                }
            };
            let record = self.mapping.map_value(&document);
            records.push(decorate(record, &document));
        }

        if skipped > 0 {
            warn!(skipped, "Some snapshots could not be parsed");
        }
        debug!(records = records.len(), "Snapshot parsing finished");
        Ok(records)
    }
}

/// CSV writer for mapped snapshot records
///
/// Column order follows the mapping specification. String values are
/// written verbatim, nulls as empty cells, and everything else (numbers,
/// booleans, arrays from projection paths) as its JSON text.
pub struct MappedCsvWriter {
    writer: Writer<BufWriter<File>>,
    columns: Vec<String>,
    records_written: u64,
}

impl MappedCsvWriter {
    /// Create a writer and emit the header row.
    pub fn new<P: AsRef<Path>>(path: P, columns: Vec<String>) -> Result<Self, ParserError> {
        Self::new_with_buffer_size(path, columns, DEFAULT_BUFFER_SIZE)
    }

    /// Create a writer with a custom buffer size.
    pub fn new_with_buffer_size<P: AsRef<Path>>(
        path: P,
        columns: Vec<String>,
        buffer_size: usize,
    ) -> Result<Self, ParserError> {
        let path = path.as_ref();
        info!("Creating CSV writer: path={}", path.display());

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = File::create(path)?;
        let buf_writer = BufWriter::with_capacity(buffer_size, file);
        let mut writer = Writer::from_writer(buf_writer);
        writer.write_record(&columns)?;

        Ok(Self {
            writer,
            columns,
            records_written: 0,
        })
    }

    /// Get number of records written so far
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Write one mapped record as a CSV row.
    pub fn write_record(&mut self, record: &Value) -> Result<(), ParserError> {
        let row: Vec<String> = self
            .columns
            .iter()
            .map(|column| cell_text(record.get(column)))
            .collect();
        self.writer.write_record(&row)?;
        self.records_written += 1;

        // Flush periodically (every 1000 records)
        if self.records_written % 1000 == 0 {
            self.flush()?;
            debug!("Progress: {} records written", self.records_written);
        }
        Ok(())
    }

    /// Flush buffered data to disk
    pub fn flush(&mut self) -> Result<(), ParserError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Close the writer and finalize output
    pub fn close(mut self) -> Result<(), ParserError> {
        self.flush()?;

        let buf_writer = self.writer.into_inner().map_err(|e| {
            ParserError::Io(std::io::Error::new(e.error().kind(), e.error().to_string()))
        })?;
        let file = buf_writer
            .into_inner()
            .map_err(|e| ParserError::Io(e.into_error()))?;
        file.sync_all()?;

        info!(
            "CSV writer closed successfully: {} records written",
            self.records_written
        );
        Ok(())
    }
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Parsing errors
#[derive(Debug, thiserror::Error)]
pub enum ParserError {
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV error
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Snapshot store error
    #[error("snapshot store error: {0}")]
    Store(#[from] StoreError),

    /// Mapping error
    #[error("mapping error: {0}")]
    Mapper(#[from] MapperError),
}
