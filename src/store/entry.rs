//! Keyspace Entry Module
//!
//! A single key of the in-memory keyspace: a typed value plus optional expiry.

use std::collections::{BTreeMap, BTreeSet};
use std::time::{SystemTime, UNIX_EPOCH};

use super::KeyType;

// == Stored Value ==
/// Typed payload of a key.
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    Text(String),
    List(Vec<String>),
    Set(BTreeSet<String>),
    /// Members kept ordered by (score, member), as ZRANGE returns them
    SortedSet(Vec<(String, f64)>),
    Hash(BTreeMap<String, String>),
}

impl StoredValue {
    pub fn key_type(&self) -> KeyType {
        match self {
            StoredValue::Text(_) => KeyType::String,
            StoredValue::List(_) => KeyType::List,
            StoredValue::Set(_) => KeyType::Set,
            StoredValue::SortedSet(_) => KeyType::ZSet,
            StoredValue::Hash(_) => KeyType::Hash,
        }
    }

    /// Approximate payload size in bytes, used for INFO memory figures.
    pub fn approx_size(&self) -> usize {
        match self {
            StoredValue::Text(s) => s.len(),
            StoredValue::List(items) => items.iter().map(String::len).sum(),
            StoredValue::Set(items) => items.iter().map(String::len).sum(),
            StoredValue::SortedSet(items) => items.iter().map(|(m, _)| m.len() + 8).sum(),
            StoredValue::Hash(fields) => fields.iter().map(|(f, v)| f.len() + v.len()).sum(),
        }
    }
}

// == Entry ==
/// A key's value and metadata.
#[derive(Debug, Clone)]
pub struct Entry {
    /// The stored value
    pub value: StoredValue,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl Entry {
    // == Constructor ==
    /// Creates a persistent entry.
    pub fn new(value: StoredValue) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    // == Expire ==
    /// Sets the entry to expire `seconds` from now.
    pub fn expire_in(&mut self, seconds: u64) {
        self.expires_at = Some(current_timestamp_ms().saturating_add(seconds.saturating_mul(1000)));
    }

    // == Is Expired ==
    /// An entry is expired once the current time reaches its expiration time.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => current_timestamp_ms() >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Remaining TTL in seconds as TTL reports it: -1 without expiry,
    /// otherwise the remaining milliseconds rounded to the nearest second.
    pub fn ttl_seconds(&self) -> i64 {
        match self.expires_at {
            Some(expires) => {
                let remaining = expires.saturating_sub(current_timestamp_ms());
                ((remaining + 500) / 1000) as i64
            }
            None => -1,
        }
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
