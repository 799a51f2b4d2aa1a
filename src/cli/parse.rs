//! Parse command implementation

use crate::layout::EndpointLayout;
use crate::mapper::MappingSpec;
use crate::parser::{MappedCsvWriter, SnapshotParser};
use crate::store::SnapshotStore;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::info;

use super::CliError;

/// Parse command arguments
#[derive(Parser, Debug)]
pub struct ParseArgs {
    /// Endpoint whose cached snapshots to export
    pub endpoint: String,

    /// Output CSV path (default: <data-dir>/<endpoint>/<endpoint>.csv)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

impl ParseArgs {
    /// Export the endpoint's snapshots through its mapping specification.
    pub fn execute(&self, data_dir: &Path) -> Result<(), CliError> {
        let layout = EndpointLayout::new(data_dir, &self.endpoint);
        if !layout.mapping_path.exists() {
            return Err(CliError::InvalidArgument(format!(
                "no mapping specification at {}",
                layout.mapping_path.display()
            )));
        }

        let mapping = MappingSpec::from_file(&layout.mapping_path)?;
        let store = SnapshotStore::new(&layout.items_dir);
        let records = SnapshotParser::new(&store, &mapping).parse_all()?;

        let output = self
            .output
            .clone()
            .unwrap_or_else(|| layout.data_path.join(format!("{}.csv", self.endpoint)));
        let columns: Vec<String> = mapping
            .field_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        let mut writer = MappedCsvWriter::new(&output, columns)?;

        let progress = create_progress_bar(records.len() as u64, &self.endpoint);
        for record in &records {
            writer.write_record(record)?;
            progress.inc(1);
        }
        progress.finish_with_message("done");
        writer.close()?;

        info!(
            records = records.len(),
            output = %output.display(),
            "Parse finished"
        );
        Ok(())
    }
}

/// Create progress bar with style
fn create_progress_bar(total: u64, endpoint: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
            .expect("hardcoded template is valid")
            .progress_chars("#>-"),
    );
    pb.set_message(format!("Exporting {endpoint}"));
    pb
}
