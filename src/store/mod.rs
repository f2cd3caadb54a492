//! Key Store Module
//!
//! The `KeyStore` trait is the single seam between the HTTP handlers / probe
//! and Redis. `RedisStore` talks to a real server through a connection pool,
//! `MemoryStore` keeps an in-process keyspace with the same observable
//! behavior for the commands this tool issues.

mod entry;
mod info;
mod memory;
mod redis_store;
mod stats;


use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Serialize, Serializer};

use crate::error::{AdminError, Result};

pub use entry::{Entry, StoredValue};
pub use info::{human_bytes, ServerInfo};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;
pub use stats::KeyspaceStats;

// == Public Constants ==
/// COUNT hint passed to every SCAN call
pub const SCAN_BATCH: usize = 100;

// == Key Store Trait ==
/// Async access to a Redis keyspace, one method per Redis command.
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// PING
    async fn ping(&self) -> Result<()>;

    /// INFO, optionally restricted to one section.
    async fn info(&self, section: Option<&str>) -> Result<ServerInfo>;

    /// DBSIZE
    async fn dbsize(&self) -> Result<u64>;

    /// One SCAN step. Returns the next cursor (0 when done) and a batch of keys.
    async fn scan(&self, cursor: u64, pattern: &str, count: usize) -> Result<(u64, Vec<String>)>;

    /// TYPE
    async fn key_type(&self, key: &str) -> Result<KeyType>;

    /// TTL in seconds; -2 when the key is absent, -1 when it never expires.
    async fn ttl(&self, key: &str) -> Result<i64>;

    /// GET
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// LRANGE key 0 -1
    async fn lrange_all(&self, key: &str) -> Result<Vec<String>>;

    /// SMEMBERS
    async fn smembers(&self, key: &str) -> Result<Vec<String>>;

    /// ZRANGE key 0 -1 WITHSCORES
    async fn zrange_with_scores(&self, key: &str) -> Result<Vec<(String, f64)>>;

    /// HGETALL
    async fn hgetall(&self, key: &str) -> Result<BTreeMap<String, String>>;

    /// SET
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// HSET with several field/value pairs. Returns the number of new fields.
    async fn hset_multiple(&self, key: &str, fields: &[(String, String)]) -> Result<u64>;

    /// RPUSH. Returns the list length after the push.
    async fn rpush(&self, key: &str, values: &[String]) -> Result<u64>;

    /// EXPIRE. Returns false when the key does not exist. A non-positive
    /// timeout deletes the key.
    async fn expire(&self, key: &str, seconds: i64) -> Result<bool>;

    /// DEL. Returns the number of keys removed.
    async fn del(&self, keys: &[String]) -> Result<u64>;

    /// FLUSHDB
    async fn flushdb(&self) -> Result<()>;

    /// FLUSHALL
    async fn flushall(&self) -> Result<()>;

    /// Runs an arbitrary command and renders the reply as JSON.
    async fn execute(&self, command: &str, args: &[String]) -> Result<serde_json::Value>;
}

// == Key Type ==
/// Redis data type of a key, as reported by TYPE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyType {
    String,
    List,
    Set,
    ZSet,
    Hash,
    Stream,
    None,
    Other(String),
}

impl KeyType {
    /// Parses the reply of TYPE.
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "string" => KeyType::String,
            "list" => KeyType::List,
            "set" => KeyType::Set,
            "zset" => KeyType::ZSet,
            "hash" => KeyType::Hash,
            "stream" => KeyType::Stream,
            "none" => KeyType::None,
            other => KeyType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            KeyType::String => "string",
            KeyType::List => "list",
            KeyType::Set => "set",
            KeyType::ZSet => "zset",
            KeyType::Hash => "hash",
            KeyType::Stream => "stream",
            KeyType::None => "none",
            KeyType::Other(name) => name,
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for KeyType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

// == Key Value ==
/// Value of a key rendered for display.
///
/// Sorted sets render as `[member, score]` pairs, types without a reader
/// (streams, absent keys) render as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum KeyValue {
    Text(String),
    Items(Vec<String>),
    Scored(Vec<(String, f64)>),
    Fields(BTreeMap<String, String>),
    Missing,
}

// == Helpers ==
/// Collects keys matching `pattern` with repeated SCAN calls.
///
/// Stops when the cursor wraps back to 0 or once `limit` keys are collected;
/// the result never holds more than `limit` keys.
pub async fn scan_keys(
    store: &dyn KeyStore,
    pattern: &str,
    limit: Option<usize>,
) -> Result<Vec<String>> {
    let limit = limit.unwrap_or(usize::MAX);
    let mut keys = Vec::new();
    let mut cursor = 0;

    loop {
        let (next, batch) = store.scan(cursor, pattern, SCAN_BATCH).await?;
        let room = limit - keys.len();
        keys.extend(batch.into_iter().take(room));

        if next == 0 || keys.len() >= limit {
            break;
        }
        cursor = next;
    }

    Ok(keys)
}

/// Reads a key with the command matching its type.
pub async fn read_value(store: &dyn KeyStore, key: &str, key_type: &KeyType) -> Result<KeyValue> {
    let value = match key_type {
        KeyType::String => store.get(key).await?.map_or(KeyValue::Missing, KeyValue::Text),
        KeyType::List => KeyValue::Items(store.lrange_all(key).await?),
        KeyType::Set => KeyValue::Items(store.smembers(key).await?),
        KeyType::ZSet => KeyValue::Scored(store.zrange_with_scores(key).await?),
        KeyType::Hash => KeyValue::Fields(store.hgetall(key).await?),
        _ => KeyValue::Missing,
    };
    Ok(value)
}

/// Stores `raw` under `key`, picking the Redis type from its shape.
///
/// A JSON object becomes hash fields (merged into an existing hash), a JSON
/// array replaces the key with a list, anything else is stored verbatim as a
/// string. A non-zero `ttl` is applied afterwards with EXPIRE.
pub async fn write_value(
    store: &dyn KeyStore,
    key: &str,
    raw: &str,
    ttl: Option<i64>,
) -> Result<()> {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Object(map)) => {
            if map.is_empty() {
                return Err(AdminError::InvalidRequest(
                    "Hash value must contain at least one field".to_string(),
                ));
            }
            let fields: Vec<(String, String)> = map
                .into_iter()
                .map(|(field, value)| (field, field_text(value)))
                .collect();
            store.hset_multiple(key, &fields).await?;
        }
        Ok(serde_json::Value::Array(items)) => {
            if items.is_empty() {
                return Err(AdminError::InvalidRequest(
                    "List value must contain at least one element".to_string(),
                ));
            }
            let values: Vec<String> = items.into_iter().map(field_text).collect();
            store.del(&[key.to_string()]).await?;
            store.rpush(key, &values).await?;
        }
        _ => store.set(key, raw).await?,
    }

    if let Some(seconds) = ttl.filter(|s| *s != 0) {
        store.expire(key, seconds).await?;
    }

    tracing::debug!(key, ?ttl, "value written");
    Ok(())
}

/// Text stored for one element of a JSON hash or list.
fn field_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_type_names() {
        for name in ["string", "list", "set", "zset", "hash", "stream", "none"] {
            assert_eq!(KeyType::from_type_name(name).as_str(), name);
        }
        assert_eq!(
            KeyType::from_type_name("ReJSON-RL"),
            KeyType::Other("ReJSON-RL".to_string())
        );
    }

    #[test]
    fn test_key_value_serialization() {
        assert_eq!(serde_json::to_value(KeyValue::Missing).unwrap(), json!(null));
        assert_eq!(
            serde_json::to_value(KeyValue::Scored(vec![("a".into(), 1.5)])).unwrap(),
            json!([["a", 1.5]])
        );
        assert_eq!(
            serde_json::to_value(KeyValue::Text("x".into())).unwrap(),
            json!("x")
        );
    }

    #[test]
    fn test_field_text() {
        assert_eq!(field_text(json!("plain")), "plain");
        assert_eq!(field_text(json!(42)), "42");
        assert_eq!(field_text(json!(true)), "true");
        assert_eq!(field_text(json!({"a": 1})), r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn test_write_value_string() {
        let store = MemoryStore::new();
        write_value(&store, "k", "hello world", None).await.unwrap();
        assert_eq!(store.key_type("k").await.unwrap(), KeyType::String);
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("hello world"));
    }

    #[tokio::test]
    async fn test_write_value_scalar_json_stays_string() {
        let store = MemoryStore::new();
        write_value(&store, "n", "123", None).await.unwrap();
        assert_eq!(store.get("n").await.unwrap().as_deref(), Some("123"));
    }

    #[tokio::test]
    async fn test_write_value_object_becomes_hash() {
        let store = MemoryStore::new();
        write_value(&store, "h", r#"{"name":"ada","age":36}"#, None)
            .await
            .unwrap();
        assert_eq!(store.key_type("h").await.unwrap(), KeyType::Hash);
        let fields = store.hgetall("h").await.unwrap();
        assert_eq!(fields.get("name").map(String::as_str), Some("ada"));
        assert_eq!(fields.get("age").map(String::as_str), Some("36"));
    }

    #[tokio::test]
    async fn test_write_value_array_replaces_key() {
        let store = MemoryStore::new();
        store.set("l", "old").await.unwrap();
        write_value(&store, "l", r#"["a","b",3]"#, None).await.unwrap();
        assert_eq!(store.key_type("l").await.unwrap(), KeyType::List);
        assert_eq!(store.lrange_all("l").await.unwrap(), vec!["a", "b", "3"]);
    }

    #[tokio::test]
    async fn test_write_value_rejects_empty_collections() {
        let store = MemoryStore::new();
        assert!(matches!(
            write_value(&store, "k", "{}", None).await,
            Err(AdminError::InvalidRequest(_))
        ));
        assert!(matches!(
            write_value(&store, "k", "[]", None).await,
            Err(AdminError::InvalidRequest(_))
        ));
        assert_eq!(store.dbsize().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_write_value_applies_ttl() {
        let store = MemoryStore::new();
        write_value(&store, "t", "v", Some(120)).await.unwrap();
        let ttl = store.ttl("t").await.unwrap();
        assert!((119..=120).contains(&ttl));

        write_value(&store, "z", "v", Some(0)).await.unwrap();
        assert_eq!(store.ttl("z").await.unwrap(), -1);
    }

    #[tokio::test]
    async fn test_write_value_negative_ttl_deletes_key() {
        let store = MemoryStore::new();
        write_value(&store, "gone", "v", Some(-5)).await.unwrap();
        assert_eq!(store.key_type("gone").await.unwrap(), KeyType::None);
        assert_eq!(store.dbsize().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_read_value_by_type() {
        let store = MemoryStore::new();
        store.set("s", "text").await.unwrap();
        store
            .rpush("l", &["x".to_string(), "y".to_string()])
            .await
            .unwrap();

        assert_eq!(
            read_value(&store, "s", &KeyType::String).await.unwrap(),
            KeyValue::Text("text".to_string())
        );
        assert_eq!(
            read_value(&store, "l", &KeyType::List).await.unwrap(),
            KeyValue::Items(vec!["x".to_string(), "y".to_string()])
        );
        assert_eq!(
            read_value(&store, "missing", &KeyType::None).await.unwrap(),
            KeyValue::Missing
        );
    }

    #[tokio::test]
    async fn test_scan_keys_respects_limit() {
        let store = MemoryStore::new();
        for i in 0..250 {
            store.set(&format!("item:{i}"), "v").await.unwrap();
        }

        assert_eq!(scan_keys(&store, "*", Some(120)).await.unwrap().len(), 120);
        assert_eq!(scan_keys(&store, "*", Some(0)).await.unwrap().len(), 0);
        assert_eq!(scan_keys(&store, "*", None).await.unwrap().len(), 250);
        assert_eq!(scan_keys(&store, "item:1?", None).await.unwrap().len(), 10);
    }
}
