//! Harvest configuration and pacing constants

use std::path::PathBuf;
use std::time::Duration;

/// Default API root used when `HARVESTER_API_ROOT` is unset.
pub const DEFAULT_API_ROOT: &str = "https://api.spotify.com/v1";

/// Default token endpoint used when `HARVESTER_AUTH_URL` is unset.
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/api/token";

/// Delay between consecutive requests in seconds.
/// The provider throttles aggressively; 10 seconds between calls keeps a
/// long harvest under the observed per-minute quota without tripping 429s.
pub const REQUEST_DELAY_SECS: u64 = 10;

/// Filename of the persisted credential cache inside the data directory.
pub const TOKEN_CACHE_FILE: &str = "auth_token.json";

/// Runtime configuration for a harvest run.
///
/// Credentials come from the environment (`HARVESTER_CLIENT_ID`,
/// `HARVESTER_CLIENT_SECRET`); URLs can be overridden for testing via
/// `HARVESTER_API_ROOT` and `HARVESTER_AUTH_URL`.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Base URL of the resource API, without trailing slash
    pub api_root: String,
    /// OAuth token endpoint for the client-credentials exchange
    pub auth_url: String,
    /// OAuth client id
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Root directory holding per-endpoint data folders
    pub data_dir: PathBuf,
    /// Path of the persisted token cache
    pub token_cache: PathBuf,
    /// Delay applied between consecutive requests (not before the first)
    pub request_delay: Duration,
}

impl HarvestConfig {
    /// Build a configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVar`] when a required credential
    /// variable is absent.
    pub fn from_env(data_dir: PathBuf) -> Result<Self, ConfigError> {
        let client_id = require_var("HARVESTER_CLIENT_ID")?;
        let client_secret = require_var("HARVESTER_CLIENT_SECRET")?;
        let api_root =
            std::env::var("HARVESTER_API_ROOT").unwrap_or_else(|_| DEFAULT_API_ROOT.to_string());
        let auth_url =
            std::env::var("HARVESTER_AUTH_URL").unwrap_or_else(|_| DEFAULT_AUTH_URL.to_string());

        let token_cache = data_dir.join(TOKEN_CACHE_FILE);
        Ok(Self {
            api_root,
            auth_url,
            client_id,
            client_secret,
            data_dir,
            token_cache,
            request_delay: Duration::from_secs(REQUEST_DELAY_SECS),
        })
    }

    /// Override the inter-request delay (tests use `Duration::ZERO`).
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }
}

fn require_var(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is not set
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),
}
