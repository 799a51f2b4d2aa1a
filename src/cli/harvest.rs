//! Harvest command implementation

use crate::auth::TokenProvider;
use crate::config::HarvestConfig;
use crate::engine::HarvestEngine;
use crate::fetcher::create_fetcher;
use crate::layout::EndpointLayout;
use crate::registry::EndpointRegistry;
use crate::store::SnapshotStore;
use clap::Parser;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use super::CliError;

/// Harvest command arguments
#[derive(Parser, Debug)]
pub struct HarvestArgs {
    /// Endpoint to harvest (run with an unknown name to list valid ones)
    pub endpoint: String,

    /// Items per batched request, clamped to the endpoint maximum.
    /// A value below 2 fetches item by item.
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Seconds to wait between consecutive requests
    #[arg(long)]
    pub request_delay: Option<u64>,
}

impl HarvestArgs {
    /// Run one harvest for the chosen endpoint.
    pub async fn execute(&self, data_dir: &Path) -> Result<(), CliError> {
        let registry = EndpointRegistry::load()
            .map_err(|e| CliError::InvalidArgument(format!("embedded registry: {e}")))?;
        let spec = registry.resolve(&self.endpoint).map_err(|e| {
            CliError::InvalidArgument(format!(
                "{e}; valid endpoints: {}",
                registry.names().join(", ")
            ))
        })?;

        let layout = EndpointLayout::new(data_dir, &self.endpoint);
        layout.ensure()?;

        let mut config = HarvestConfig::from_env(data_dir.to_path_buf())?;
        if let Some(secs) = self.request_delay {
            config = config.with_request_delay(Duration::from_secs(secs));
        }

        let auth = TokenProvider::new(
            config.auth_url.clone(),
            config.client_id.clone(),
            config.client_secret.clone(),
            config.token_cache.clone(),
        );
        let fetcher = create_fetcher(&config, spec, auth);
        let store = SnapshotStore::new(&layout.items_dir);
        let engine = HarvestEngine::new(&self.endpoint, fetcher, store, &layout.ledger_path)
            .with_request_delay(config.request_delay);

        let batch_size = spec.effective_batch_size(self.batch_size);
        let report = engine.run(batch_size).await?;

        info!(
            fetched = report.fetched,
            already_cached = report.already_cached,
            failed = report.failed.len(),
            missing = report.missing.len(),
            "Harvest finished"
        );
        if !report.failed.is_empty() {
            warn!(
                ids = ?report.failed,
                "Rejected identifiers were dropped from the ledger"
            );
        }
        if !report.missing.is_empty() {
            warn!(
                ids = ?report.missing,
                "Identifiers missing from batch responses stay pending for the next run"
            );
        }
        Ok(())
    }
}
