//! # Snapshot Harvester Library
//!
//! A rate-limit-aware scrape-and-cache pipeline for web APIs. Identifiers
//! of interest are kept in per-endpoint ledgers; each harvest run fetches
//! the items not yet cached, writes one JSON snapshot per item, and marks
//! the ledger so interrupted runs resume where they left off. Cached
//! snapshots can later be flattened into CSV through a declarative field
//! mapping, entirely offline.
//!
//! ## Quick Start
//!
//! ```no_run
//! use snapshot_harvester::auth::TokenProvider;
//! use snapshot_harvester::config::HarvestConfig;
//! use snapshot_harvester::engine::HarvestEngine;
//! use snapshot_harvester::fetcher::create_fetcher;
//! use snapshot_harvester::layout::EndpointLayout;
//! use snapshot_harvester::registry::EndpointRegistry;
//! use snapshot_harvester::store::SnapshotStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HarvestConfig::from_env("data".into())?;
//! let registry = EndpointRegistry::load_embedded()?;
//! let spec = registry.resolve("tracks")?;
//!
//! let layout = EndpointLayout::new(&config.data_dir, "tracks");
//! layout.ensure()?;
//!
//! let auth = TokenProvider::new(
//!     config.auth_url.clone(),
//!     config.client_id.clone(),
//!     config.client_secret.clone(),
//!     config.token_cache.clone(),
//! );
//! let fetcher = create_fetcher(&config, spec, auth);
//! let store = SnapshotStore::new(&layout.items_dir);
//!
//! let engine = HarvestEngine::new("tracks", fetcher, store, &layout.ledger_path)
//!     .with_request_delay(config.request_delay);
//! let report = engine.run(spec.effective_batch_size(None)).await?;
//! println!("fetched {} snapshots", report.fetched);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`registry`] - Embedded registry of harvestable endpoints
//! - [`layout`] - Per-endpoint data folder layout
//! - [`ledger`] - Identifier ledger, reconciled against cached snapshots
//! - [`auth`] - Client-credentials token provider with on-disk cache
//! - [`fetcher`] - HTTP fetch strategies and the rate-limit-aware executor
//! - [`engine`] - Harvest orchestration (batching, fallback, commit)
//! - [`store`] - One-JSON-file-per-item snapshot store
//! - [`mapper`] - Declarative field mapping over JSON documents
//! - [`parser`] - Offline snapshot-to-CSV export
//! - [`discover`] - One-shot identifier discovery

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Client-credentials authorization
pub mod auth;

/// CLI command implementations
pub mod cli;

/// Runtime configuration
pub mod config;

/// Identifier discovery
pub mod discover;

/// Harvest orchestration
pub mod engine;

/// Endpoint fetch strategies
pub mod fetcher;

/// Per-endpoint data folder layout
pub mod layout;

/// Identifier ledger
pub mod ledger;

/// Declarative field mapping
pub mod mapper;

/// Snapshot parsing and CSV export
pub mod parser;

/// Endpoint registry
pub mod registry;

/// Snapshot store
pub mod store;

// Re-export commonly used types
pub use engine::{HarvestEngine, HarvestReport};
pub use ledger::IdentifierLedger;
pub use mapper::MappingSpec;
pub use store::SnapshotStore;
