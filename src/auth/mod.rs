//! Bearer-token authorization with lazy client-credentials renewal
//!
//! The provider keeps one credential, persisted next to the data folders so
//! a still-valid token survives process restarts. A token is considered
//! expired a few seconds before its actual expiry so a request issued right
//! at the boundary never carries a stale credential. A failed exchange is
//! fatal for the calling run; there is no retry.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Safety margin: treat a token as expired this many seconds early.
pub const EXPIRY_MARGIN_SECS: i64 = 4;

/// A bearer credential with its absolute expiry instant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiToken {
    /// Opaque access token
    pub access_token: String,
    /// Token type, normally "Bearer"
    pub token_type: String,
    /// Absolute expiry instant
    pub expires_at: DateTime<Utc>,
}

impl ApiToken {
    /// Whether the token is within the safety margin of expiry
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now() + ChronoDuration::seconds(EXPIRY_MARGIN_SECS)
    }

    /// Render the `Authorization` header value
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

/// Token endpoint response body
#[derive(Debug, Deserialize)]
struct ExchangeResponse {
    access_token: String,
    token_type: String,
    expires_in: i64,
}

/// Supplies the current `Authorization` header, renewing lazily.
pub struct TokenProvider {
    auth_url: String,
    client_id: String,
    client_secret: String,
    cache_path: PathBuf,
    client: reqwest::Client,
    token: Mutex<Option<ApiToken>>,
}

impl TokenProvider {
    /// Create a provider, loading a persisted credential if one exists.
    pub fn new(
        auth_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        cache_path: impl Into<PathBuf>,
    ) -> Self {
        let cache_path = cache_path.into();
        let token = load_cached(&cache_path);
        if token.is_some() {
            debug!(path = %cache_path.display(), "Loaded persisted credential");
        }
        Self {
            auth_url: auth_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            cache_path,
            client: reqwest::Client::new(),
            token: Mutex::new(token),
        }
    }

    /// Current `Authorization` header value, renewing the credential first
    /// if it is expired or absent.
    ///
    /// # Errors
    ///
    /// [`AuthError::ExchangeFailed`] on a non-2xx exchange response; callers
    /// must treat this as unrecoverable for the run.
    pub async fn authorization_header(&self) -> AuthResult<String> {
        if let Some(token) = self.current_valid_token() {
            return Ok(token.authorization_header());
        }

        let token = self.exchange().await?;
        let header = token.authorization_header();
        self.store(token)?;
        Ok(header)
    }

    /// The cached token, if present and not within the expiry margin
    fn current_valid_token(&self) -> Option<ApiToken> {
        let guard = self.token.lock().expect("token lock poisoned");
        guard.as_ref().filter(|t| !t.is_expired()).cloned()
    }

    /// Perform the client-credentials exchange.
    async fn exchange(&self) -> AuthResult<ApiToken> {
        info!("Requesting new access token");
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        let response = self
            .client
            .post(&self.auth_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::ExchangeFailed {
                status: status.as_u16(),
                body,
            });
        }

        let body: ExchangeResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Parse(e.to_string()))?;

        Ok(ApiToken {
            access_token: body.access_token,
            token_type: body.token_type,
            expires_at: Utc::now() + ChronoDuration::seconds(body.expires_in),
        })
    }

    /// Cache the token in memory and persist it for later runs.
    fn store(&self, token: ApiToken) -> AuthResult<()> {
        persist_token(&self.cache_path, &token)?;
        let mut guard = self.token.lock().expect("token lock poisoned");
        *guard = Some(token);
        Ok(())
    }
}

/// Load a persisted token; unreadable caches are treated as absent.
fn load_cached(path: &Path) -> Option<ApiToken> {
    if !path.exists() {
        return None;
    }
    let contents = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&contents) {
        Ok(token) => Some(token),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Ignoring unreadable token cache");
            None
        }
    }
}

/// Atomically write the token cache.
fn persist_token(path: &Path, token: &ApiToken) -> AuthResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| AuthError::Io(format!("Failed to create cache folder: {e}")))?;
    }
    let json = serde_json::to_string_pretty(token)
        .map_err(|e| AuthError::Serialization(e.to_string()))?;
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(parent)
        .map_err(|e| AuthError::Io(format!("Failed to create temp file: {e}")))?;
    temp.write_all(json.as_bytes())
        .map_err(|e| AuthError::Io(format!("Failed to write token cache: {e}")))?;
    temp.persist(path)
        .map_err(|e| AuthError::Io(format!("Failed to persist token cache: {e}")))?;
    debug!(path = %path.display(), "Persisted credential");
    Ok(())
}

/// Result type for auth operations
pub type AuthResult<T> = Result<T, AuthError>;

/// Authorization errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Token endpoint returned a non-2xx status; fatal for the run
    #[error("token exchange failed with status {status}: {body}")]
    ExchangeFailed {
        /// HTTP status code of the exchange response
        status: u16,
        /// Response body, for diagnostics
        body: String,
    },

    /// Network-level failure reaching the token endpoint
    #[error("network error: {0}")]
    Network(String),

    /// Exchange response body could not be parsed
    #[error("parse error: {0}")]
    Parse(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
}
