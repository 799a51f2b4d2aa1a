//! Rate-limit-aware request execution
//!
//! [`send_with_wait`] is the single place rate limiting is handled: it
//! reissues a request for as long as the provider answers with the
//! rate-limit status, sleeping for the server-stated `Retry-After` interval
//! between attempts. The loop is intentionally unbounded - the server owns
//! the pacing. Every other status, success or failure, is returned to the
//! caller to classify.

use std::future::Future;
use tracing::{debug, info};

use super::{FetcherError, FetcherResult};

/// Status code the provider uses to signal a rate limit
pub const RATE_LIMIT_STATUS: u16 = 429;

/// Wait applied when a rate-limit response carries no `Retry-After` header
const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

/// A materialized HTTP response: status, rate-limit wait hint, and body
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// `Retry-After` header in whole seconds, when present
    pub retry_after: Option<u64>,
    /// Response body text
    pub body: String,
}

impl ApiResponse {
    /// Whether the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether the status is the provider's rate-limit signal
    pub fn is_rate_limited(&self) -> bool {
        self.status == RATE_LIMIT_STATUS
    }

    /// Parse the body as JSON
    pub fn json(&self) -> FetcherResult<serde_json::Value> {
        serde_json::from_str(&self.body)
            .map_err(|e| FetcherError::Parse(format!("Failed to parse response body: {e}")))
    }

    /// Materialize a reqwest response, capturing the `Retry-After` header.
    pub async fn from_response(response: reqwest::Response) -> FetcherResult<Self> {
        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = response
            .text()
            .await
            .map_err(|e| FetcherError::Network(format!("Failed to read response body: {e}")))?;
        Ok(Self {
            status,
            retry_after,
            body,
        })
    }
}

/// Issue a request, transparently waiting out rate limits.
///
/// `request` performs exactly one HTTP call per invocation. Rate-limit
/// responses never escape this function; any other status is handed back
/// as-is, including non-2xx errors.
pub async fn send_with_wait<F, Fut>(mut request: F) -> FetcherResult<ApiResponse>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = FetcherResult<ApiResponse>>,
{
    let mut response = request().await?;
    while response.is_rate_limited() {
        let wait_secs = response.retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        info!(
            wait_secs,
            "Rate limit exceeded, sleeping until the window resets"
        );
        tokio::time::sleep(std::time::Duration::from_secs(wait_secs)).await;
        debug!("Reissuing rate-limited request");
        response = request().await?;
    }
    Ok(response)
}
