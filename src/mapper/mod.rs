//! Declarative JSON-to-record field mapping
//!
//! A mapping specification is a JSON object of output field name to dotted
//! path, e.g. `{"artist_names": "artists[].name"}`. Paths are parsed and
//! validated once when the specification is loaded; malformed paths fail
//! fast instead of surfacing mid-run.
//!
//! Path grammar:
//! - plain segments perform a key lookup and default to an empty object when
//!   the key is absent, so deeper lookups dead-end into null/empty values
//!   instead of raising;
//! - a segment ending in `[]` addresses an array. As the final segment it
//!   yields the array with empty elements (null, false, zero, `""`, `[]`,
//!   `{}`) removed; followed by one subkey it
//!   projects that subkey across the non-null elements, dropping elements
//!   lacking the subkey or carrying a null value.
//!
//! Extraction is a structural projection, not validation: missing data
//! yields empty/null values and type correctness is deferred to the record
//! type being deserialized into.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::path::Path;

/// Marker suffix for list-projection segments
const PROJECTION_MARKER: &str = "[]";

/// True for values a terminal projection discards: null, false, zero,
/// and empty strings, arrays and objects.
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// One parsed, validated field path
#[derive(Debug, Clone, PartialEq, Eq)]
enum FieldPath {
    /// Chain of plain key lookups
    Keys(Vec<String>),
    /// Key lookups down to an array, then an optional subkey projection
    Projection {
        prefix: Vec<String>,
        array_key: String,
        subkey: Option<String>,
    },
}

impl FieldPath {
    /// Parse and validate a dotted path.
    fn parse(path: &str) -> Result<Self, String> {
        if path.is_empty() {
            return Err("path is empty".to_string());
        }
        let segments: Vec<&str> = path.split('.').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err("path contains an empty segment".to_string());
        }

        let projected: Vec<usize> = segments
            .iter()
            .enumerate()
            .filter(|(_, s)| s.contains(PROJECTION_MARKER))
            .map(|(i, _)| i)
            .collect();

        match projected.as_slice() {
            [] => Ok(FieldPath::Keys(
                segments.into_iter().map(String::from).collect(),
            )),
            [ix] => {
                let segment = segments[*ix];
                let Some(array_key) = segment.strip_suffix(PROJECTION_MARKER) else {
                    return Err(format!(
                        "list marker must terminate its segment: {segment}"
                    ));
                };
                if array_key.is_empty() || array_key.contains(PROJECTION_MARKER) {
                    return Err(format!("invalid list segment: {segment}"));
                }
                let trailing = segments.len() - 1 - ix;
                if trailing > 1 {
                    return Err(
                        "only one subkey may follow a list-projection segment".to_string()
                    );
                }
                Ok(FieldPath::Projection {
                    prefix: segments[..*ix].iter().map(|s| s.to_string()).collect(),
                    array_key: array_key.to_string(),
                    subkey: segments.get(ix + 1).map(|s| s.to_string()),
                })
            }
            _ => Err("path contains more than one list-projection segment".to_string()),
        }
    }

    /// Extract the value this path addresses out of a document.
    fn extract(&self, document: &Value) -> Value {
        match self {
            FieldPath::Keys(keys) => {
                let mut current = document.clone();
                for key in keys {
                    // Value::get is None for non-objects too, so a lookup
                    // through a scalar dead-ends the same way as an absent key
                    current = current.get(key).cloned().unwrap_or(Value::Object(Map::new()));
                }
                current
            }
            FieldPath::Projection {
                prefix,
                array_key,
                subkey,
            } => {
                let mut current = document.clone();
                for key in prefix {
                    current = current.get(key).cloned().unwrap_or(Value::Object(Map::new()));
                }
                let items = current
                    .get(array_key)
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default();

                let collected = match subkey {
                    None => items.into_iter().filter(|v| !is_empty_value(v)).collect(),
                    Some(subkey) => items
                        .iter()
                        .filter(|item| !item.is_null())
                        .filter_map(|item| item.get(subkey))
                        .filter(|v| !v.is_null())
                        .cloned()
                        .collect(),
                };
                Value::Array(collected)
            }
        }
    }
}

/// Validated mapping from output field names to JSON paths
#[derive(Debug, Clone)]
pub struct MappingSpec {
    fields: Vec<(String, FieldPath)>,
}

impl MappingSpec {
    /// Build a specification from field/path pairs, validating every path.
    pub fn from_pairs<I, S>(pairs: I) -> MapperResult<Self>
    where
        I: IntoIterator<Item = (S, S)>,
        S: Into<String>,
    {
        let mut fields = Vec::new();
        for (field, path) in pairs {
            let field = field.into();
            let path = path.into();
            let parsed = FieldPath::parse(&path).map_err(|reason| MapperError::InvalidPath {
                field: field.clone(),
                path: path.clone(),
                reason,
            })?;
            fields.push((field, parsed));
        }
        Ok(Self { fields })
    }

    /// Load a specification from a `mapping.json` file.
    pub fn from_file(path: &Path) -> MapperResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| MapperError::Io(format!("Failed to read {}: {e}", path.display())))?;
        let raw: Map<String, Value> = serde_json::from_str(&contents)
            .map_err(|e| MapperError::Parse(format!("Invalid mapping file: {e}")))?;

        let mut pairs = Vec::new();
        for (field, value) in raw {
            let Value::String(path) = value else {
                return Err(MapperError::Parse(format!(
                    "Mapping value for {field} must be a path string"
                )));
            };
            pairs.push((field, path));
        }
        Self::from_pairs(pairs)
    }

    /// Output field names, in specification order.
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(f, _)| f.as_str()).collect()
    }

    /// Project a document into a JSON object keyed by the output fields.
    pub fn map_value(&self, document: &Value) -> Value {
        let mut out = Map::new();
        for (field, path) in &self.fields {
            out.insert(field.clone(), path.extract(document));
        }
        Value::Object(out)
    }

    /// Project a document into a typed record whose fields are exactly the
    /// specification's keys.
    pub fn map<T: DeserializeOwned>(&self, document: &Value) -> MapperResult<T> {
        serde_json::from_value(self.map_value(document))
            .map_err(|e| MapperError::Deserialize(e.to_string()))
    }
}

/// Result type for mapper operations
pub type MapperResult<T> = Result<T, MapperError>;

/// Mapper errors
#[derive(Debug, thiserror::Error)]
pub enum MapperError {
    /// A path in the specification failed validation
    #[error("invalid path {path:?} for field {field}: {reason}")]
    InvalidPath {
        /// Output field name
        field: String,
        /// Offending path string
        path: String,
        /// Why the path is malformed
        reason: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(String),

    /// Mapping file parse error
    #[error("parse error: {0}")]
    Parse(String),

    /// Projected object did not fit the record type
    #[error("deserialization error: {0}")]
    Deserialize(String),
}
