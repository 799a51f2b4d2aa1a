//! Endpoint registry for harvestable entity types
//!
//! The registry maps an endpoint name to the metadata needed to build its
//! fetch strategy: the API path, the key under which batched responses list
//! their items, and the maximum batch size the provider accepts. The
//! strategy for an endpoint is selected once at startup from this table.

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashMap;

/// Embedded registry data
const ENDPOINTS_JSON: &str = include_str!("endpoints.json");

/// Global registry instance (loaded once)
static REGISTRY: Lazy<Result<EndpointRegistry, RegistryError>> =
    Lazy::new(|| EndpointRegistry::from_json(ENDPOINTS_JSON));

/// Registry of harvestable endpoints
#[derive(Debug, Clone)]
pub struct EndpointRegistry {
    #[allow(dead_code)]
    schema_version: String,
    entries_map: HashMap<String, EndpointSpec>,
}

impl EndpointRegistry {
    /// Load the embedded registry
    ///
    /// This is a singleton operation - the registry is loaded once and cached.
    pub fn load() -> Result<&'static Self, &'static RegistryError> {
        REGISTRY.as_ref()
    }

    /// Load embedded registry, returning an owned copy
    pub fn load_embedded() -> Result<Self, RegistryError> {
        Self::from_json(ENDPOINTS_JSON)
    }

    /// Parse registry from JSON string
    fn from_json(json: &str) -> Result<Self, RegistryError> {
        let raw: RawRegistry = serde_json::from_str(json)
            .map_err(|e| RegistryError::ParseError(format!("Failed to parse registry: {e}")))?;

        let mut entries_map = HashMap::new();
        for entry in raw.endpoints {
            entries_map.insert(entry.name.clone(), entry);
        }

        Ok(Self {
            schema_version: raw.schema_version,
            entries_map,
        })
    }

    /// Get the spec for an endpoint name
    pub fn get(&self, name: &str) -> Option<&EndpointSpec> {
        self.entries_map.get(name)
    }

    /// Resolve an endpoint name, rejecting unknown names
    pub fn resolve(&self, name: &str) -> Result<&EndpointSpec, RegistryError> {
        self.get(name).ok_or_else(|| {
            RegistryError::NotFound(format!("Endpoint {name} not found in registry"))
        })
    }

    /// List all registered endpoint names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries_map.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Raw registry file structure
#[derive(Debug, Deserialize)]
struct RawRegistry {
    schema_version: String,
    endpoints: Vec<EndpointSpec>,
}

/// Metadata for one harvestable endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointSpec {
    /// Endpoint name, also the data folder name (e.g. "tracks")
    pub name: String,
    /// Path segment appended to the API root
    pub api_path: String,
    /// Key under which batched responses list their items
    pub items_key: String,
    /// Maximum number of ids the provider accepts in one batched call;
    /// 1 means the endpoint only supports single-item fetches
    pub batch_max: usize,
}

impl EndpointSpec {
    /// Clamp a requested batch size to what the endpoint supports
    pub fn effective_batch_size(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.batch_max).min(self.batch_max).max(1)
    }
}

/// Registry errors
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Registry file could not be parsed
    #[error("registry parse error: {0}")]
    ParseError(String),

    /// Endpoint not present in the registry
    #[error("registry error: {0}")]
    NotFound(String),
}
