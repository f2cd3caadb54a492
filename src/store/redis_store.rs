//! Redis Store Module
//!
//! `KeyStore` backed by a real Redis server through a deadpool connection pool.

use std::collections::BTreeMap;

use async_trait::async_trait;
use deadpool_redis::{
    redis::{self, Value},
    Connection, Pool, PoolConfig, Runtime,
};
use serde_json::{json, Map};
use tracing::{debug, info};

use super::{KeyStore, KeyType, ServerInfo};
use crate::config::Config;
use crate::error::{AdminError, Result};

// == Redis Store ==
/// Pooled connection to the configured Redis database.
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool,
}

impl RedisStore {
    /// Builds the pool. Connections are opened lazily on first use.
    pub fn connect(config: &Config) -> Result<Self> {
        let mut cfg = deadpool_redis::Config::from_url(config.redis_url());
        cfg.pool = Some(PoolConfig::new(config.pool_size));
        let pool = cfg.create_pool(Some(Runtime::Tokio1))?;

        info!(
            host = %config.redis_host,
            port = config.redis_port,
            db = config.redis_db,
            pool_size = config.pool_size,
            "Redis connection pool created"
        );
        Ok(Self { pool })
    }

    async fn conn(&self) -> Result<Connection> {
        Ok(self.pool.get().await?)
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("pool", &self.pool.status())
            .finish()
    }
}

#[async_trait]
impl KeyStore for RedisStore {
    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn info(&self, section: Option<&str>) -> Result<ServerInfo> {
        let mut conn = self.conn().await?;
        let mut cmd = redis::cmd("INFO");
        if let Some(section) = section {
            cmd.arg(section);
        }
        let text: String = cmd.query_async(&mut conn).await?;
        Ok(ServerInfo::parse(&text))
    }

    async fn dbsize(&self) -> Result<u64> {
        let mut conn = self.conn().await?;
        Ok(redis::cmd("DBSIZE").query_async(&mut conn).await?)
    }

    async fn scan(&self, cursor: u64, pattern: &str, count: usize) -> Result<(u64, Vec<String>)> {
        let mut conn = self.conn().await?;
        let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(count)
            .query_async(&mut conn)
            .await?;
        debug!(cursor, next, batch = keys.len(), pattern, "scan step");
        Ok((next, keys))
    }

    async fn key_type(&self, key: &str) -> Result<KeyType> {
        let mut conn = self.conn().await?;
        let name: String = redis::cmd("TYPE").arg(key).query_async(&mut conn).await?;
        Ok(KeyType::from_type_name(&name))
    }

    async fn ttl(&self, key: &str) -> Result<i64> {
        let mut conn = self.conn().await?;
        Ok(redis::cmd("TTL").arg(key).query_async(&mut conn).await?)
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn().await?;
        Ok(redis::cmd("GET").arg(key).query_async(&mut conn).await?)
    }

    async fn lrange_all(&self, key: &str) -> Result<Vec<String>> {
        let mut conn = self.conn().await?;
        Ok(redis::cmd("LRANGE")
            .arg(key)
            .arg(0)
            .arg(-1)
            .query_async(&mut conn)
            .await?)
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        let mut conn = self.conn().await?;
        Ok(redis::cmd("SMEMBERS").arg(key).query_async(&mut conn).await?)
    }

    async fn zrange_with_scores(&self, key: &str) -> Result<Vec<(String, f64)>> {
        let mut conn = self.conn().await?;
        Ok(redis::cmd("ZRANGE")
            .arg(key)
            .arg(0)
            .arg(-1)
            .arg("WITHSCORES")
            .query_async(&mut conn)
            .await?)
    }

    async fn hgetall(&self, key: &str) -> Result<BTreeMap<String, String>> {
        let mut conn = self.conn().await?;
        Ok(redis::cmd("HGETALL").arg(key).query_async(&mut conn).await?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn hset_multiple(&self, key: &str, fields: &[(String, String)]) -> Result<u64> {
        let mut conn = self.conn().await?;
        let mut cmd = redis::cmd("HSET");
        cmd.arg(key);
        for (field, value) in fields {
            cmd.arg(field).arg(value);
        }
        Ok(cmd.query_async(&mut conn).await?)
    }

    async fn rpush(&self, key: &str, values: &[String]) -> Result<u64> {
        let mut conn = self.conn().await?;
        Ok(redis::cmd("RPUSH")
            .arg(key)
            .arg(values)
            .query_async(&mut conn)
            .await?)
    }

    async fn expire(&self, key: &str, seconds: i64) -> Result<bool> {
        let mut conn = self.conn().await?;
        Ok(redis::cmd("EXPIRE")
            .arg(key)
            .arg(seconds)
            .query_async(&mut conn)
            .await?)
    }

    async fn del(&self, keys: &[String]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn().await?;
        Ok(redis::cmd("DEL").arg(keys).query_async(&mut conn).await?)
    }

    async fn flushdb(&self) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: () = redis::cmd("FLUSHDB").query_async(&mut conn).await?;
        Ok(())
    }

    async fn flushall(&self) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: () = redis::cmd("FLUSHALL").query_async(&mut conn).await?;
        Ok(())
    }

    async fn execute(&self, command: &str, args: &[String]) -> Result<serde_json::Value> {
        let usage = connection_use(command, args);
        if usage == ConnectionUse::Streaming {
            return Err(AdminError::InvalidRequest(format!(
                "Command {} is not supported from the console",
                command.to_ascii_uppercase()
            )));
        }

        let mut conn = self.conn().await?;
        let reply: redis::RedisResult<Value> = redis::cmd(command)
            .arg(args)
            .query_async(&mut conn)
            .await;

        if usage == ConnectionUse::Detached {
            // Never hand a connection with altered state back to the pool
            drop(Connection::take(conn));
            debug!(command, "connection detached from pool");
        }
        reply_to_json(reply?)
    }
}

// == Connection State ==
/// How a raw command may use a pooled connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConnectionUse {
    /// Leaves no per-connection state behind
    Shared,
    /// Changes per-connection state (selected db, transaction, name, ...);
    /// the connection is discarded afterwards
    Detached,
    /// Turns the connection into a push stream
    Streaming,
}

pub(crate) fn connection_use(command: &str, args: &[String]) -> ConnectionUse {
    match command.to_ascii_uppercase().as_str() {
        "SUBSCRIBE" | "PSUBSCRIBE" | "SSUBSCRIBE" | "MONITOR" | "SYNC" | "PSYNC" => {
            ConnectionUse::Streaming
        }
        "SELECT" | "MULTI" | "EXEC" | "DISCARD" | "WATCH" | "UNWATCH" | "READONLY"
        | "READWRITE" | "RESET" | "AUTH" | "HELLO" | "UNSUBSCRIBE" | "PUNSUBSCRIBE"
        | "SUNSUBSCRIBE" => ConnectionUse::Detached,
        "CLIENT" => match args.first().map(|sub| sub.to_ascii_uppercase()).as_deref() {
            Some("SETNAME" | "SETINFO" | "TRACKING" | "REPLY" | "NO-EVICT" | "NO-TOUCH") => {
                ConnectionUse::Detached
            }
            _ => ConnectionUse::Shared,
        },
        _ => ConnectionUse::Shared,
    }
}

// == Reply Conversion ==
/// Renders a raw Redis reply as JSON. Bulk strings are decoded as lossy UTF-8.
pub(crate) fn reply_to_json(value: Value) -> Result<serde_json::Value> {
    let json = match value {
        Value::Nil => serde_json::Value::Null,
        Value::Int(n) => json!(n),
        Value::BulkString(bytes) => json!(String::from_utf8_lossy(&bytes)),
        Value::SimpleString(s) => json!(s),
        Value::Okay => json!("OK"),
        Value::Double(d) => json!(d),
        Value::Boolean(b) => json!(b),
        Value::VerbatimString { text, .. } => json!(text),
        Value::Array(items) | Value::Set(items) => serde_json::Value::Array(
            items
                .into_iter()
                .map(reply_to_json)
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::Map(pairs) => {
            let mut object = Map::with_capacity(pairs.len());
            for (key, value) in pairs {
                object.insert(map_key(reply_to_json(key)?), reply_to_json(value)?);
            }
            serde_json::Value::Object(object)
        }
        Value::Attribute { data, .. } => reply_to_json(*data)?,
        Value::ServerError(err) => {
            return Err(AdminError::Redis(format!("{err:?}")));
        }
        other => json!(format!("{other:?}")),
    };
    Ok(json)
}

fn map_key(key: serde_json::Value) -> String {
    match key {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}
