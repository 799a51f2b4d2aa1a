//! Identifier discovery
//!
//! One-shot lookups that seed a ledger with fresh identifiers: playlists
//! of a browse category, or artists matching a search query. Discovery
//! shares the request executor with the harvest path, so rate limiting is
//! honored here too.

use crate::auth::TokenProvider;
use crate::fetcher::{send_with_wait, ApiResponse, FetcherError};
use serde_json::Value;
use tracing::{debug, info};

/// Maximum artists returned per search query
const SEARCH_LIMIT: u32 = 40;

/// Discovers identifiers worth harvesting
pub struct IdDiscoverer {
    client: reqwest::Client,
    api_root: String,
    auth: TokenProvider,
}

impl IdDiscoverer {
    /// Create a discoverer against an API root.
    pub fn new(api_root: impl Into<String>, auth: TokenProvider) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_root: api_root.into(),
            auth,
        }
    }

    /// List the playlist ids of a browse category.
    pub async fn playlist_ids(&self, category: &str) -> Result<Vec<String>, DiscoverError> {
        let url = format!("{}/browse/categories/{category}/playlists", self.api_root);
        let response = send_with_wait(|| self.get(&url, &[])).await?;
        let ids = extract_ids(response, "/playlists/items")?;
        info!(category, found = ids.len(), "Discovered playlist ids");
        Ok(ids)
    }

    /// Search for artists and return their ids.
    pub async fn artist_ids(&self, query: &str) -> Result<Vec<String>, DiscoverError> {
        let url = format!("{}/search", self.api_root);
        let query_params = [
            ("q", query.to_string()),
            ("type", "artist".to_string()),
            ("limit", SEARCH_LIMIT.to_string()),
        ];
        let response = send_with_wait(|| self.get(&url, &query_params)).await?;
        let ids = extract_ids(response, "/artists/items")?;
        info!(query, found = ids.len(), "Discovered artist ids");
        Ok(ids)
    }

    async fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<ApiResponse, FetcherError> {
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

/// Pull the `id` of every item at `items_pointer` in a listing response.
fn extract_ids(response: ApiResponse, items_pointer: &str) -> Result<Vec<String>, DiscoverError> {
    if !response.is_success() {
        return Err(DiscoverError::RequestFailed {
            status: response.status,
            body: response.body,
        });
    }
    let document = response.json()?;
    let ids = document
        .pointer(items_pointer)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("id").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    Ok(ids)
}

/// Discovery errors
#[derive(Debug, thiserror::Error)]
pub enum DiscoverError {
    /// Fetcher error
    #[error("fetcher error: {0}")]
    Fetcher(#[from] FetcherError),

    /// The listing request was rejected
    #[error("discovery request failed with status {status}: {body}")]
    RequestFailed {
        /// HTTP status code of the rejected response
        status: u16,
        /// Response body, kept for diagnostics
        body: String,
    },
}
