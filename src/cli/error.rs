//! CLI error types and conversions

use crate::config::ConfigError;
use crate::discover::DiscoverError;
use crate::engine::HarvestError;
use crate::layout::LayoutError;
use crate::ledger::LedgerError;
use crate::mapper::MapperError;
use crate::parser::ParserError;
use crate::registry::RegistryError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    /// Registry error
    #[error("registry error: {0}")]
    RegistryError(#[from] RegistryError),

    /// Layout error
    #[error("layout error: {0}")]
    LayoutError(#[from] LayoutError),

    /// Harvest error
    #[error("harvest error: {0}")]
    HarvestError(#[from] HarvestError),

    /// Parser error
    #[error("parser error: {0}")]
    ParserError(#[from] ParserError),

    /// Discovery error
    #[error("discovery error: {0}")]
    DiscoverError(#[from] DiscoverError),

    /// Mapping error
    #[error("mapping error: {0}")]
    MapperError(#[from] MapperError),

    /// Ledger error
    #[error("ledger error: {0}")]
    LedgerError(#[from] LedgerError),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
