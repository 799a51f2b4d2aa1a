//! CLI command implementations

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod discover;
pub mod error;
pub mod harvest;
pub mod parse;

pub use discover::{DiscoverArgs, DiscoverSource};
pub use error::CliError;
pub use harvest::HarvestArgs;
pub use parse::ParseArgs;

/// Snapshot Harvester CLI
#[derive(Parser, Debug)]
#[command(name = "snapshot-harvester")]
#[command(about = "Harvest API snapshots into a local cache and export them as CSV", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Root directory holding per-endpoint data folders (default: "data")
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

impl Cli {
    /// Resolved data directory
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| PathBuf::from("data"))
    }
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch every uncached identifier of an endpoint
    Harvest(HarvestArgs),

    /// Export an endpoint's cached snapshots as CSV
    Parse(ParseArgs),

    /// Find new identifiers and append them to a ledger
    Discover(DiscoverArgs),
}
