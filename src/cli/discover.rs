//! Discover command implementation

use crate::auth::TokenProvider;
use crate::config::HarvestConfig;
use crate::discover::IdDiscoverer;
use crate::layout::EndpointLayout;
use crate::ledger::IdentifierLedger;
use clap::{Parser, Subcommand};
use std::path::Path;
use tracing::info;

use super::CliError;

/// Discover command arguments
#[derive(Parser, Debug)]
pub struct DiscoverArgs {
    /// Where to look for new identifiers
    #[command(subcommand)]
    pub source: DiscoverSource,
}

/// Identifier sources
#[derive(Subcommand, Debug)]
pub enum DiscoverSource {
    /// Playlists of a browse category
    Playlists {
        /// Browse category id
        category: String,
    },
    /// Artists matching a search query
    Artists {
        /// Search query
        query: String,
    },
}

impl DiscoverArgs {
    /// Discover identifiers and append the new ones to the endpoint ledger.
    pub async fn execute(&self, data_dir: &Path) -> Result<(), CliError> {
        let config = HarvestConfig::from_env(data_dir.to_path_buf())?;
        let auth = TokenProvider::new(
            config.auth_url.clone(),
            config.client_id.clone(),
            config.client_secret.clone(),
            config.token_cache.clone(),
        );
        let discoverer = IdDiscoverer::new(config.api_root.clone(), auth);

        let (endpoint, ids) = match &self.source {
            DiscoverSource::Playlists { category } => {
                ("playlists", discoverer.playlist_ids(category).await?)
            }
            DiscoverSource::Artists { query } => ("artists", discoverer.artist_ids(query).await?),
        };

        let layout = EndpointLayout::new(data_dir, endpoint);
        layout.ensure()?;
        let added = IdentifierLedger::append(&layout.ledger_path, &ids)?;

        info!(
            endpoint,
            discovered = ids.len(),
            added,
            ledger = %layout.ledger_path.display(),
            "Discovery finished"
        );
        Ok(())
    }
}
