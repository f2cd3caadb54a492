//! Request DTOs for the admin API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;

use crate::error::{AdminError, Result};

/// Default number of keys returned by the key listing
pub const DEFAULT_KEY_LIMIT: usize = 100;

/// Request body for POST /redis-admin/api/key
///
/// `value` is stored as a hash when it is a JSON object, as a list when it
/// is a JSON array and as a plain string otherwise.
#[derive(Debug, Clone, Deserialize)]
pub struct SetKeyRequest {
    /// The key to write
    #[serde(default)]
    pub key: String,
    /// Raw value text
    #[serde(default)]
    pub value: String,
    /// Optional TTL in seconds; zero is ignored, a negative value deletes
    /// the key as EXPIRE does
    #[serde(default)]
    pub ttl: Option<i64>,
}

impl SetKeyRequest {
    /// Returns an error message if the request is unusable, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        None
    }
}

/// Request body for POST /redis-admin/api/execute
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecuteRequest {
    /// Command line, e.g. `GET user:1`
    #[serde(default)]
    pub command: String,
}

/// Query string for GET /redis-admin/api/keys
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KeysQuery {
    pub pattern: Option<String>,
    pub limit: Option<String>,
}

impl KeysQuery {
    /// Match pattern, `*` when absent or empty.
    pub fn pattern(&self) -> &str {
        match self.pattern.as_deref() {
            Some(p) if !p.is_empty() => p,
            _ => "*",
        }
    }

    /// Maximum number of keys to return.
    pub fn limit(&self) -> Result<usize> {
        match self.limit.as_deref().map(str::trim) {
            None | Some("") => Ok(DEFAULT_KEY_LIMIT),
            Some(raw) => raw.parse().map_err(|_| {
                AdminError::InvalidRequest(format!("Invalid limit '{raw}': expected a non-negative integer"))
            }),
        }
    }
}
