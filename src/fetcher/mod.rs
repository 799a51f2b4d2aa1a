//! Endpoint fetch strategies
//!
//! An [`EndpointFetcher`] knows how to retrieve items for one endpoint,
//! singly or in batches. The HTTP implementation is selected once at
//! startup from the endpoint registry; tests substitute scripted fakes.

use crate::auth::{AuthError, TokenProvider};
use crate::config::HarvestConfig;
use crate::registry::EndpointSpec;
use async_trait::async_trait;
use tracing::debug;

pub mod http;

pub use http::{send_with_wait, ApiResponse, RATE_LIMIT_STATUS};

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// Network error
    #[error("network error: {0}")]
    Network(String),

    /// Response parse error
    #[error("parse error: {0}")]
    Parse(String),

    /// Authorization failure; fatal for the run
    #[error("authorization error: {0}")]
    Auth(#[from] AuthError),

    /// A batched request was issued with no ids
    #[error("cannot send a batch request with 0 ids")]
    EmptyBatch,
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Fetch strategy for one endpoint
#[async_trait]
pub trait EndpointFetcher: Send + Sync {
    /// Fetch a single item by id. Performs exactly one HTTP call.
    async fn fetch_one(&self, id: &str) -> FetcherResult<ApiResponse>;

    /// Fetch a batch of items in one call.
    ///
    /// # Errors
    ///
    /// [`FetcherError::EmptyBatch`] when `ids` is empty; no network call is
    /// made in that case.
    async fn fetch_batch(&self, ids: &[String]) -> FetcherResult<ApiResponse>;

    /// Key under which batched responses list their items
    fn items_key(&self) -> &str;
}

/// HTTP fetcher for one endpoint of the resource API
pub struct ApiFetcher {
    client: reqwest::Client,
    base_url: String,
    items_key: String,
    auth: TokenProvider,
}

impl ApiFetcher {
    /// Build the fetcher for an endpoint spec.
    pub fn new(config: &HarvestConfig, spec: &EndpointSpec, auth: TokenProvider) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: format!("{}/{}", config.api_root, spec.api_path),
            items_key: spec.items_key.clone(),
            auth,
        }
    }

    async fn get(&self, url: &str, query: &[(&str, String)]) -> FetcherResult<ApiResponse> {
        let authorization = self.auth.authorization_header().await?;
        debug!(url, "Issuing GET request");
        let response = self
            .client
            .get(url)
            .query(query)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .send()
            .await
            .map_err(|e| FetcherError::Network(e.to_string()))?;
        ApiResponse::from_response(response).await
    }
}

#[async_trait]
impl EndpointFetcher for ApiFetcher {
    async fn fetch_one(&self, id: &str) -> FetcherResult<ApiResponse> {
        let url = format!("{}/{id}", self.base_url);
        self.get(&url, &[]).await
    }

    async fn fetch_batch(&self, ids: &[String]) -> FetcherResult<ApiResponse> {
        if ids.is_empty() {
            return Err(FetcherError::EmptyBatch);
        }
        let joined = ids.join(",");
        self.get(&self.base_url, &[("ids", joined)]).await
    }

    fn items_key(&self) -> &str {
        &self.items_key
    }
}

/// Create the fetch strategy for an endpoint, selected once at startup.
pub fn create_fetcher(
    config: &HarvestConfig,
    spec: &EndpointSpec,
    auth: TokenProvider,
) -> Box<dyn EndpointFetcher> {
    Box::new(ApiFetcher::new(config, spec, auth))
}
