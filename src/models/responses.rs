//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::store::{KeyType, KeyValue, ServerInfo};

/// Response body for GET /redis-admin/api/stats
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub redis_version: String,
    pub uptime_days: u64,
    pub connected_clients: u64,
    pub used_memory: u64,
    pub used_memory_human: String,
    /// Same as `used_memory_human`; read by the bundled page
    pub memory_human: String,
    /// Number of keys in the selected database
    pub db_keys: u64,
    pub total_commands_processed: u64,
}

impl StatsResponse {
    /// Builds the summary from INFO fields, substituting defaults for
    /// anything the server did not report.
    pub fn from_info(info: &ServerInfo, db_keys: u64) -> Self {
        let memory_human = info.get("used_memory_human").unwrap_or("0B").to_string();
        Self {
            redis_version: info.get("redis_version").unwrap_or("Unknown").to_string(),
            uptime_days: info.parsed("uptime_in_days").unwrap_or(0),
            connected_clients: info.parsed("connected_clients").unwrap_or(0),
            used_memory: info.parsed("used_memory").unwrap_or(0),
            used_memory_human: memory_human.clone(),
            memory_human,
            db_keys,
            total_commands_processed: info.parsed("total_commands_processed").unwrap_or(0),
        }
    }
}

/// One entry of the key listing
#[derive(Debug, Clone, Serialize)]
pub struct KeySummary {
    pub key: String,
    #[serde(rename = "type")]
    pub key_type: KeyType,
}

/// Response body for GET /redis-admin/api/keys
#[derive(Debug, Clone, Serialize)]
pub struct KeyListResponse {
    pub keys: Vec<KeySummary>,
    pub total: usize,
}

impl KeyListResponse {
    pub fn new(keys: Vec<KeySummary>) -> Self {
        let total = keys.len();
        Self { keys, total }
    }
}

/// Response body for GET /redis-admin/api/key/<key>
#[derive(Debug, Clone, Serialize)]
pub struct KeyDetailResponse {
    pub key: String,
    #[serde(rename = "type")]
    pub key_type: KeyType,
    pub value: KeyValue,
    /// Seconds left; -1 without expiry, -2 when the key is absent
    pub ttl: i64,
}

/// Response body for writes and flushes
#[derive(Debug, Clone, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Response body for DELETE /redis-admin/api/key/<key>
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    /// Number of keys removed (0 or 1)
    pub deleted: u64,
}

impl DeleteResponse {
    pub fn new(deleted: u64) -> Self {
        Self {
            success: true,
            deleted,
        }
    }
}

/// Response body for POST /redis-admin/api/execute
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteResponse {
    /// Command reply rendered as JSON
    pub result: serde_json::Value,
    /// The command line as received, trimmed
    pub command: String,
}

/// Response body for GET /redis-admin/health
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy" or "unhealthy"
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Redis answered PING.
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            redis: Some("connected".to_string()),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Redis could not be reached.
    pub fn unhealthy(error: impl Into<String>) -> Self {
        Self {
            status: "unhealthy".to_string(),
            redis: None,
            error: Some(error.into()),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
