//! Harvest orchestration
//!
//! The engine drives one run for one endpoint: load and reconcile the
//! identifier ledger, fetch every uncached identifier (singly or in
//! batches with per-item fallback), write one snapshot per item, and
//! commit the ledger once at the end, excluding the run's failures.
//!
//! Each identifier moves through Pending -> Fetching -> Stored or Failed;
//! a failed identifier never aborts the run, it is recorded and retried on
//! the next run because the commit drops it from the ledger only when the
//! provider rejected it outright.
//!
//! All network calls are issued strictly sequentially. The only waits are
//! the inter-request pacing delay and whatever `Retry-After` sleeps the
//! request executor performs internally.

use crate::fetcher::{send_with_wait, EndpointFetcher, FetcherError};
use crate::ledger::{IdentifierLedger, LedgerError};
use crate::store::{SnapshotStore, StoreError};
use serde_json::Value;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Outcome summary of one harvest run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HarvestReport {
    /// Snapshots written during this run
    pub fetched: usize,
    /// Identifiers the provider rejected (non-2xx after rate-limit
    /// resolution); dropped from the ledger at commit
    pub failed: Vec<String>,
    /// Identifiers silently omitted from a batched response; kept in the
    /// ledger and retried on the next run
    pub missing: Vec<String>,
    /// Identifiers that already had a snapshot before the run
    pub already_cached: usize,
}

/// Paces consecutive requests: no delay before the first request of a run,
/// a fixed delay before every following one.
struct Pacer {
    delay: Duration,
    first: bool,
}

impl Pacer {
    fn new(delay: Duration) -> Self {
        Self { delay, first: true }
    }

    async fn wait(&mut self) {
        if self.first {
            self.first = false;
            return;
        }
        if !self.delay.is_zero() {
            debug!(delay_secs = self.delay.as_secs(), "Pacing before next request");
            tokio::time::sleep(self.delay).await;
        }
    }
}

/// Orchestrates the scrape-and-cache loop for one endpoint
pub struct HarvestEngine {
    endpoint: String,
    fetcher: Box<dyn EndpointFetcher>,
    store: SnapshotStore,
    ledger_path: PathBuf,
    request_delay: Duration,
}

impl HarvestEngine {
    /// Create an engine for an endpoint.
    pub fn new(
        endpoint: impl Into<String>,
        fetcher: Box<dyn EndpointFetcher>,
        store: SnapshotStore,
        ledger_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            fetcher,
            store,
            ledger_path: ledger_path.into(),
            request_delay: Duration::ZERO,
        }
    }

    /// Set the inter-request pacing delay.
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    /// Run one harvest. `batch_size >= 2` selects batch mode; anything
    /// lower fetches item by item.
    pub async fn run(&self, batch_size: usize) -> Result<HarvestReport, HarvestError> {
        let span = tracing::info_span!("harvest", endpoint = %self.endpoint, batch_size);
        let _enter = span.enter();

        info!("Starting harvest run");

        let ledger = IdentifierLedger::load(&self.ledger_path, &self.store)?;
        let pending = ledger.uncached_ids();
        let mut report = HarvestReport {
            already_cached: ledger.records().len() - pending.len(),
            ..Default::default()
        };

        if pending.is_empty() {
            info!(
                cached = report.already_cached,
                "All identifiers already cached, nothing to fetch"
            );
            return Ok(report);
        }
        info!(uncached = pending.len(), "Fetching uncached identifiers");

        let mut errors: HashSet<String> = HashSet::new();
        let mut pacer = Pacer::new(self.request_delay);

        if batch_size >= 2 {
            self.run_batched(&pending, batch_size, &mut pacer, &mut errors, &mut report)
                .await?;
        } else {
            self.run_sequential(&pending, &mut pacer, &mut errors, &mut report)
                .await?;
        }

        ledger.commit(&self.ledger_path, &errors)?;
        info!(
            fetched = report.fetched,
            failed = report.failed.len(),
            missing = report.missing.len(),
            "Harvest run complete"
        );
        Ok(report)
    }

    /// Fetch each identifier with its own request.
    async fn run_sequential(
        &self,
        ids: &[String],
        pacer: &mut Pacer,
        errors: &mut HashSet<String>,
        report: &mut HarvestReport,
    ) -> Result<(), HarvestError> {
        for id in ids {
            pacer.wait().await;
            let response = send_with_wait(|| self.fetcher.fetch_one(id)).await?;

            if !response.is_success() {
                warn!(id = %id, status = response.status, "Fetch failed, will retry next run");
                errors.insert(id.clone());
                report.failed.push(id.clone());
                continue;
            }

            match response.json() {
                Ok(document) => {
                    self.store.write(id, &document)?;
                    report.fetched += 1;
                    info!(id = %id, status = response.status, "Snapshot stored");
                }
                Err(e) => {
                    warn!(id = %id, error = %e, "Response body is not valid JSON");
                    errors.insert(id.clone());
                    report.failed.push(id.clone());
                }
            }
        }
        Ok(())
    }

    /// Fetch identifiers in chunks, falling back to per-item requests when a
    /// batched request fails.
    async fn run_batched(
        &self,
        ids: &[String],
        batch_size: usize,
        pacer: &mut Pacer,
        errors: &mut HashSet<String>,
        report: &mut HarvestReport,
    ) -> Result<(), HarvestError> {
        for chunk in ids.chunks(batch_size) {
            pacer.wait().await;
            let response = send_with_wait(|| self.fetcher.fetch_batch(chunk)).await?;

            let items: Vec<Value> = if response.is_success() {
                let document = response.json()?;
                document
                    .get(self.fetcher.items_key())
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default()
            } else {
                warn!(
                    status = response.status,
                    chunk_len = chunk.len(),
                    "Batched request failed, fetching this chunk item by item"
                );
                self.fallback_chunk(chunk, pacer, errors, report).await?
            };

            let mut pending: HashSet<&str> = chunk.iter().map(String::as_str).collect();
            for item in &items {
                // The API reports deleted or malformed entries as null slots
                if item.is_null() {
                    debug!("Skipping null item in batch response");
                    continue;
                }
                let Some(id) = item.get("id").and_then(Value::as_str) else {
                    warn!("Batch item carries no id field, skipping");
                    continue;
                };
                self.store.write(id, item)?;
                pending.remove(id);
                report.fetched += 1;
                info!(id = %id, "Snapshot stored");
            }

            // Ids the response omitted stay uncached and are retried on the
            // next run; fallback failures are already accounted as errors.
            for id in chunk {
                if pending.contains(id.as_str()) && !errors.contains(id) {
                    warn!(id = %id, "Batch response is missing this id");
                    report.missing.push(id.clone());
                }
            }
        }
        Ok(())
    }

    /// Refetch every id of a failed chunk individually, synthesizing the
    /// item list a successful batched response would have carried.
    async fn fallback_chunk(
        &self,
        chunk: &[String],
        pacer: &mut Pacer,
        errors: &mut HashSet<String>,
        report: &mut HarvestReport,
    ) -> Result<Vec<Value>, HarvestError> {
        let mut items = Vec::new();
        for id in chunk {
            pacer.wait().await;
            let response = send_with_wait(|| self.fetcher.fetch_one(id)).await?;

            if !response.is_success() {
                warn!(id = %id, status = response.status, "Fetch failed, will retry next run");
                errors.insert(id.clone());
                report.failed.push(id.clone());
                continue;
            }

            match response.json() {
                Ok(document) => items.push(document),
                Err(e) => {
                    warn!(id = %id, error = %e, "Response body is not valid JSON");
                    errors.insert(id.clone());
                    report.failed.push(id.clone());
                }
            }
        }
        Ok(items)
    }
}

/// Harvest errors
#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    /// Fetcher error (authorization failures surface here and are fatal)
    #[error("fetcher error: {0}")]
    Fetcher(#[from] FetcherError),

    /// Ledger error
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Snapshot store error
    #[error("snapshot store error: {0}")]
    Store(#[from] StoreError),
}
