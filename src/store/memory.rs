//! Memory Store Module
//!
//! In-process keyspace implementing `KeyStore`. Keys expire lazily when they
//! are touched; type mismatches fail with Redis' WRONGTYPE error.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use glob::Pattern;
use serde_json::json;
use tokio::sync::Mutex;

use super::{human_bytes, Entry, KeyType, KeyspaceStats, KeyStore, ServerInfo, StoredValue};
use crate::error::{AdminError, Result};

// == Public Constants ==
/// Number of logical databases, as in a default Redis configuration
pub const DATABASES: usize = 16;

const WRONGTYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";

// == Keyspace ==
#[derive(Debug)]
struct Keyspace {
    dbs: Vec<HashMap<String, Entry>>,
    stats: KeyspaceStats,
    peak_memory: u64,
    started: Instant,
}

impl Keyspace {
    fn new() -> Self {
        Self {
            dbs: (0..DATABASES).map(|_| HashMap::new()).collect(),
            stats: KeyspaceStats::new(),
            peak_memory: 0,
            started: Instant::now(),
        }
    }

    /// Drops `key` if its TTL elapsed, then returns the live entry.
    fn live(&mut self, db: usize, key: &str) -> Option<&mut Entry> {
        if self.dbs[db].get(key).is_some_and(Entry::is_expired) {
            self.dbs[db].remove(key);
            self.stats.record_expired();
        }
        self.dbs[db].get_mut(key)
    }

    /// Live entry for a read, counted as a keyspace hit or miss.
    fn lookup(&mut self, db: usize, key: &str) -> Option<&mut Entry> {
        let found = self.live(db, key).is_some();
        if found {
            self.stats.record_hit();
        } else {
            self.stats.record_miss();
        }
        self.dbs[db].get_mut(key)
    }

    fn purge_expired(&mut self, db: usize) {
        let before = self.dbs[db].len();
        self.dbs[db].retain(|_, entry| !entry.is_expired());
        for _ in self.dbs[db].len()..before {
            self.stats.record_expired();
        }
    }

    fn key_type(&mut self, db: usize, key: &str) -> KeyType {
        self.live(db, key)
            .map_or(KeyType::None, |entry| entry.value.key_type())
    }

    fn ttl(&mut self, db: usize, key: &str) -> i64 {
        self.live(db, key).map_or(-2, |entry| entry.ttl_seconds())
    }

    fn get(&mut self, db: usize, key: &str) -> Result<Option<String>> {
        match self.lookup(db, key).map(|entry| &entry.value) {
            None => Ok(None),
            Some(StoredValue::Text(s)) => Ok(Some(s.clone())),
            Some(_) => Err(wrong_type()),
        }
    }

    fn set(&mut self, db: usize, key: &str, value: &str) {
        self.dbs[db].insert(
            key.to_string(),
            Entry::new(StoredValue::Text(value.to_string())),
        );
        self.track_memory();
    }

    fn del(&mut self, db: usize, keys: &[String]) -> u64 {
        let mut removed = 0;
        for key in keys {
            if self.live(db, key).is_some() {
                self.dbs[db].remove(key.as_str());
                removed += 1;
            }
        }
        removed
    }

    fn exists(&mut self, db: usize, keys: &[String]) -> u64 {
        keys.iter()
            .filter(|key| self.live(db, key).is_some())
            .count() as u64
    }

    /// A non-positive timeout deletes the key right away.
    fn expire(&mut self, db: usize, key: &str, seconds: i64) -> bool {
        let Some(entry) = self.live(db, key) else {
            return false;
        };
        match u64::try_from(seconds) {
            Ok(seconds) if seconds > 0 => entry.expire_in(seconds),
            _ => {
                self.dbs[db].remove(key);
                self.stats.record_expired();
            }
        }
        true
    }

    fn dbsize(&mut self, db: usize) -> u64 {
        self.purge_expired(db);
        self.dbs[db].len() as u64
    }

    /// Sorted live keys of `db` matching `pattern`.
    fn matching_keys(&mut self, db: usize, pattern: &str) -> Vec<String> {
        self.purge_expired(db);
        let matcher = redis_pattern(pattern);
        let mut keys: Vec<String> = self.dbs[db]
            .keys()
            .filter(|key| matcher.as_ref().is_some_and(|m| m.matches(key)))
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    /// Cursor is an offset into the sorted key list; COUNT bounds how many
    /// keys are visited per call, matching is applied afterwards.
    fn scan(&mut self, db: usize, cursor: u64, pattern: &str, count: usize) -> (u64, Vec<String>) {
        self.purge_expired(db);
        let mut all: Vec<&String> = self.dbs[db].keys().collect();
        all.sort();

        let start = (cursor as usize).min(all.len());
        let end = start.saturating_add(count.max(1)).min(all.len());
        let matcher = redis_pattern(pattern);
        let batch = all[start..end]
            .iter()
            .filter(|key| matcher.as_ref().is_some_and(|m| m.matches(key)))
            .map(|key| key.to_string())
            .collect();

        let next = if end >= all.len() { 0 } else { end as u64 };
        (next, batch)
    }

    fn used_memory(&self) -> u64 {
        self.dbs
            .iter()
            .flat_map(|db| db.iter())
            .map(|(key, entry)| (key.len() + entry.value.approx_size()) as u64)
            .sum()
    }

    fn track_memory(&mut self) {
        self.peak_memory = self.peak_memory.max(self.used_memory());
    }

    /// INFO text, optionally restricted to one section.
    fn info_text(&mut self, section: Option<&str>) -> String {
        for db in 0..DATABASES {
            self.purge_expired(db);
        }
        let uptime = self.started.elapsed().as_secs();
        let used = self.used_memory();
        self.peak_memory = self.peak_memory.max(used);

        let keyspace: String = self
            .dbs
            .iter()
            .enumerate()
            .filter(|(_, keys)| !keys.is_empty())
            .map(|(i, keys)| {
                let expires = keys.values().filter(|e| e.expires_at.is_some()).count();
                format!("db{i}:keys={},expires={expires},avg_ttl=0\r\n", keys.len())
            })
            .collect();

        let sections = [
            (
                "server",
                format!(
                    "redis_version:{}\r\nredis_mode:standalone\r\nuptime_in_seconds:{uptime}\r\nuptime_in_days:{}\r\n",
                    env!("CARGO_PKG_VERSION"),
                    uptime / 86_400
                ),
            ),
            ("clients", "connected_clients:1\r\n".to_string()),
            (
                "memory",
                format!(
                    "used_memory:{used}\r\nused_memory_human:{}\r\nused_memory_peak:{}\r\nused_memory_peak_human:{}\r\nmem_fragmentation_ratio:1.00\r\n",
                    human_bytes(used),
                    self.peak_memory,
                    human_bytes(self.peak_memory)
                ),
            ),
            (
                "stats",
                format!(
                    "total_connections_received:1\r\ntotal_commands_processed:{}\r\nexpired_keys:{}\r\nevicted_keys:0\r\nkeyspace_hits:{}\r\nkeyspace_misses:{}\r\n",
                    self.stats.total_commands_processed,
                    self.stats.expired_keys,
                    self.stats.keyspace_hits,
                    self.stats.keyspace_misses
                ),
            ),
            ("keyspace", keyspace),
        ];

        let wanted = section
            .map(str::to_ascii_lowercase)
            .filter(|s| s != "all" && s != "default" && s != "everything");

        sections
            .iter()
            .filter(|(name, _)| wanted.as_deref().map_or(true, |w| w == *name))
            .map(|(name, body)| {
                let mut title = name.to_string();
                title[..1].make_ascii_uppercase();
                format!("# {title}\r\n{body}\r\n")
            })
            .collect()
    }
}

// == Memory Store ==
/// In-memory `KeyStore` with sixteen logical databases.
///
/// Handles returned by [`MemoryStore::select`] share the same keyspace, so
/// FLUSHALL on one is visible through every other.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    keyspace: Arc<Mutex<Keyspace>>,
    db: usize,
}

impl MemoryStore {
    /// Creates an empty keyspace with database 0 selected.
    pub fn new() -> Self {
        Self {
            keyspace: Arc::new(Mutex::new(Keyspace::new())),
            db: 0,
        }
    }

    /// Handle on another database of the same keyspace.
    pub fn select(&self, db: usize) -> Result<Self> {
        if db >= DATABASES {
            return Err(AdminError::Redis("ERR DB index is out of range".to_string()));
        }
        Ok(Self {
            keyspace: Arc::clone(&self.keyspace),
            db,
        })
    }

    /// Snapshot of the keyspace counters.
    pub async fn stats(&self) -> KeyspaceStats {
        self.keyspace.lock().await.stats.clone()
    }

    async fn lock(&self) -> tokio::sync::MutexGuard<'_, Keyspace> {
        let mut keyspace = self.keyspace.lock().await;
        keyspace.stats.record_command();
        keyspace
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a matcher for a Redis MATCH pattern.
///
/// Redis and `glob` disagree on a few points: Redis negates a class with `^`
/// and escapes with `\`, while `glob` uses `!` and bracketed literals, and
/// rejects `**` outside a whole path component. Those forms are rewritten;
/// a pattern `glob` still cannot parse matches nothing.
fn redis_pattern(pattern: &str) -> Option<Pattern> {
    let mut translated = String::with_capacity(pattern.len() + 4);
    let mut chars = pattern.chars().peekable();
    let mut in_class = false;

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) if in_class => translated.push(escaped),
                Some(escaped) => {
                    translated.push('[');
                    translated.push(escaped);
                    translated.push(']');
                }
                None => translated.push_str("[\\]"),
            },
            '[' if !in_class => {
                in_class = true;
                translated.push('[');
                if chars.peek() == Some(&'^') {
                    chars.next();
                    translated.push('!');
                }
            }
            ']' if in_class => {
                in_class = false;
                translated.push(']');
            }
            '*' if !in_class => {
                while chars.peek() == Some(&'*') {
                    chars.next();
                }
                translated.push('*');
            }
            other => translated.push(other),
        }
    }

    Pattern::new(&translated).ok()
}

fn wrong_type() -> AdminError {
    AdminError::Redis(WRONGTYPE.to_string())
}

fn arity(command: &str) -> AdminError {
    AdminError::Redis(format!(
        "ERR wrong number of arguments for '{}' command",
        command.to_ascii_lowercase()
    ))
}

fn parse_int<T: std::str::FromStr>(raw: &str) -> Result<T> {
    raw.parse()
        .map_err(|_| AdminError::Redis("ERR value is not an integer or out of range".to_string()))
}

#[async_trait]
impl KeyStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        let _keyspace = self.lock().await;
        Ok(())
    }

    async fn info(&self, section: Option<&str>) -> Result<ServerInfo> {
        let text = self.lock().await.info_text(section);
        Ok(ServerInfo::parse(&text))
    }

    async fn dbsize(&self) -> Result<u64> {
        Ok(self.lock().await.dbsize(self.db))
    }

    async fn scan(&self, cursor: u64, pattern: &str, count: usize) -> Result<(u64, Vec<String>)> {
        Ok(self.lock().await.scan(self.db, cursor, pattern, count))
    }

    async fn key_type(&self, key: &str) -> Result<KeyType> {
        Ok(self.lock().await.key_type(self.db, key))
    }

    async fn ttl(&self, key: &str) -> Result<i64> {
        Ok(self.lock().await.ttl(self.db, key))
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.lock().await.get(self.db, key)
    }

    async fn lrange_all(&self, key: &str) -> Result<Vec<String>> {
        match self.lock().await.lookup(self.db, key).map(|e| &e.value) {
            None => Ok(Vec::new()),
            Some(StoredValue::List(items)) => Ok(items.clone()),
            Some(_) => Err(wrong_type()),
        }
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        match self.lock().await.lookup(self.db, key).map(|e| &e.value) {
            None => Ok(Vec::new()),
            Some(StoredValue::Set(items)) => Ok(items.iter().cloned().collect()),
            Some(_) => Err(wrong_type()),
        }
    }

    async fn zrange_with_scores(&self, key: &str) -> Result<Vec<(String, f64)>> {
        match self.lock().await.lookup(self.db, key).map(|e| &e.value) {
            None => Ok(Vec::new()),
            Some(StoredValue::SortedSet(items)) => Ok(items.clone()),
            Some(_) => Err(wrong_type()),
        }
    }

    async fn hgetall(&self, key: &str) -> Result<BTreeMap<String, String>> {
        match self.lock().await.lookup(self.db, key).map(|e| &e.value) {
            None => Ok(BTreeMap::new()),
            Some(StoredValue::Hash(fields)) => Ok(fields.clone()),
            Some(_) => Err(wrong_type()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock().await.set(self.db, key, value);
        Ok(())
    }

    async fn hset_multiple(&self, key: &str, fields: &[(String, String)]) -> Result<u64> {
        if fields.is_empty() {
            return Err(arity("hset"));
        }
        let mut keyspace = self.lock().await;
        let db = self.db;
        if keyspace.live(db, key).is_none() {
            keyspace.dbs[db].insert(key.to_string(), Entry::new(StoredValue::Hash(BTreeMap::new())));
        }
        let added = match keyspace.dbs[db].get_mut(key).map(|e| &mut e.value) {
            Some(StoredValue::Hash(map)) => fields
                .iter()
                .filter(|(field, value)| map.insert(field.clone(), value.clone()).is_none())
                .count() as u64,
            _ => return Err(wrong_type()),
        };
        keyspace.track_memory();
        Ok(added)
    }

    async fn rpush(&self, key: &str, values: &[String]) -> Result<u64> {
        if values.is_empty() {
            return Err(arity("rpush"));
        }
        let mut keyspace = self.lock().await;
        let db = self.db;
        if keyspace.live(db, key).is_none() {
            keyspace.dbs[db].insert(key.to_string(), Entry::new(StoredValue::List(Vec::new())));
        }
        let len = match keyspace.dbs[db].get_mut(key).map(|e| &mut e.value) {
            Some(StoredValue::List(items)) => {
                items.extend(values.iter().cloned());
                items.len() as u64
            }
            _ => return Err(wrong_type()),
        };
        keyspace.track_memory();
        Ok(len)
    }

    async fn expire(&self, key: &str, seconds: i64) -> Result<bool> {
        Ok(self.lock().await.expire(self.db, key, seconds))
    }

    async fn del(&self, keys: &[String]) -> Result<u64> {
        Ok(self.lock().await.del(self.db, keys))
    }

    async fn flushdb(&self) -> Result<()> {
        self.lock().await.dbs[self.db].clear();
        Ok(())
    }

    async fn flushall(&self) -> Result<()> {
        let mut keyspace = self.lock().await;
        keyspace.dbs.iter_mut().for_each(HashMap::clear);
        Ok(())
    }

    async fn execute(&self, command: &str, args: &[String]) -> Result<serde_json::Value> {
        let name = command.to_ascii_uppercase();
        let mut keyspace = self.lock().await;
        let db = self.db;

        let reply = match (name.as_str(), args) {
            ("PING", []) => json!("PONG"),
            ("PING", [message]) | ("ECHO", [message]) => json!(message),
            ("GET", [key]) => json!(keyspace.get(db, key)?),
            ("SET", [key, value]) => {
                keyspace.set(db, key, value);
                json!("OK")
            }
            ("DEL", keys) if !keys.is_empty() => json!(keyspace.del(db, keys)),
            ("EXISTS", keys) if !keys.is_empty() => json!(keyspace.exists(db, keys)),
            ("TYPE", [key]) => json!(keyspace.key_type(db, key).as_str()),
            ("TTL", [key]) => json!(keyspace.ttl(db, key)),
            ("EXPIRE", [key, seconds]) => {
                let seconds = parse_int::<i64>(seconds)?;
                json!(u8::from(keyspace.expire(db, key, seconds)))
            }
            ("DBSIZE", []) => json!(keyspace.dbsize(db)),
            ("KEYS", [pattern]) => json!(keyspace.matching_keys(db, pattern)),
            ("FLUSHDB", []) => {
                keyspace.dbs[db].clear();
                json!("OK")
            }
            ("FLUSHALL", []) => {
                keyspace.dbs.iter_mut().for_each(HashMap::clear);
                json!("OK")
            }
            ("INFO", []) => json!(keyspace.info_text(None)),
            ("INFO", [section]) => json!(keyspace.info_text(Some(section))),
            (
                "PING" | "ECHO" | "GET" | "SET" | "DEL" | "EXISTS" | "TYPE" | "TTL" | "EXPIRE"
                | "DBSIZE" | "KEYS" | "FLUSHDB" | "FLUSHALL" | "INFO",
                _,
            ) => return Err(arity(&name)),
            _ => {
                return Err(AdminError::Redis(format!(
                    "ERR unknown command '{command}', with args beginning with: {}",
                    args.iter()
                        .map(|a| format!("'{a}'"))
                        .collect::<Vec<_>>()
                        .join(" ")
                )))
            }
        };

        Ok(reply)
    }
}

impl MemoryStore {
    /// Adds members to a set, creating it when absent.
    pub async fn sadd(&self, key: &str, members: &[&str]) -> Result<u64> {
        let mut keyspace = self.lock().await;
        let db = self.db;
        if keyspace.live(db, key).is_none() {
            keyspace.dbs[db].insert(key.to_string(), Entry::new(StoredValue::Set(BTreeSet::new())));
        }
        match keyspace.dbs[db].get_mut(key).map(|e| &mut e.value) {
            Some(StoredValue::Set(set)) => Ok(members
                .iter()
                .filter(|m| set.insert(m.to_string()))
                .count() as u64),
            _ => Err(wrong_type()),
        }
    }

    /// Adds scored members to a sorted set, creating it when absent.
    pub async fn zadd(&self, key: &str, members: &[(&str, f64)]) -> Result<u64> {
        let mut keyspace = self.lock().await;
        let db = self.db;
        if keyspace.live(db, key).is_none() {
            keyspace.dbs[db].insert(key.to_string(), Entry::new(StoredValue::SortedSet(Vec::new())));
        }
        match keyspace.dbs[db].get_mut(key).map(|e| &mut e.value) {
            Some(StoredValue::SortedSet(items)) => {
                let mut added = 0;
                for (member, score) in members {
                    match items.iter_mut().find(|(m, _)| m == member) {
                        Some(existing) => existing.1 = *score,
                        None => {
                            items.push((member.to_string(), *score));
                            added += 1;
                        }
                    }
                }
                items.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
                Ok(added)
            }
            _ => Err(wrong_type()),
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let store = MemoryStore::new();
        store.set("key1", "value1").await.unwrap();

        assert_eq!(store.get("key1").await.unwrap().as_deref(), Some("value1"));
        assert_eq!(store.key_type("key1").await.unwrap(), KeyType::String);
        assert_eq!(store.ttl("key1").await.unwrap(), -1);
        assert_eq!(store.dbsize().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_key() {
        let store = MemoryStore::new();

        assert_eq!(store.get("nope").await.unwrap(), None);
        assert_eq!(store.key_type("nope").await.unwrap(), KeyType::None);
        assert_eq!(store.ttl("nope").await.unwrap(), -2);
        assert!(store.lrange_all("nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        store.set("a", "1").await.unwrap();
        store.set("b", "2").await.unwrap();

        let removed = store.del(&strings(&["a", "b", "c"])).await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.key_type("a").await.unwrap(), KeyType::None);
    }

    #[tokio::test]
    async fn test_wrong_type() {
        let store = MemoryStore::new();
        store.rpush("list", &strings(&["x"])).await.unwrap();

        let err = store.get("list").await.unwrap_err();
        assert!(err.to_string().starts_with("WRONGTYPE"));
        assert!(store
            .hset_multiple("list", &[("f".to_string(), "v".to_string())])
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_hash_merge() {
        let store = MemoryStore::new();
        let added = store
            .hset_multiple("h", &[("a".into(), "1".into()), ("b".into(), "2".into())])
            .await
            .unwrap();
        assert_eq!(added, 2);

        let added = store
            .hset_multiple("h", &[("b".into(), "3".into()), ("c".into(), "4".into())])
            .await
            .unwrap();
        assert_eq!(added, 1);

        let fields = store.hgetall("h").await.unwrap();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields["b"], "3");
    }

    #[tokio::test]
    async fn test_set_and_sorted_set() {
        let store = MemoryStore::new();
        store.sadd("s", &["b", "a", "b"]).await.unwrap();
        store.zadd("z", &[("low", 1.0), ("high", 5.0), ("mid", 2.5)]).await.unwrap();

        assert_eq!(store.smembers("s").await.unwrap(), vec!["a", "b"]);
        assert_eq!(
            store.zrange_with_scores("z").await.unwrap(),
            vec![
                ("low".to_string(), 1.0),
                ("mid".to_string(), 2.5),
                ("high".to_string(), 5.0)
            ]
        );
        assert_eq!(store.key_type("z").await.unwrap(), KeyType::ZSet);
    }

    #[tokio::test]
    async fn test_expire_and_lazy_eviction() {
        let store = MemoryStore::new();
        store.set("short", "v").await.unwrap();
        assert!(store.expire("short", 1).await.unwrap());
        assert!(!store.expire("absent", 1).await.unwrap());

        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert_eq!(store.get("short").await.unwrap(), None);
        assert_eq!(store.ttl("short").await.unwrap(), -2);
        assert_eq!(store.stats().await.expired_keys, 1);
    }

    #[test]
    fn test_redis_pattern_translation() {
        let matches = |pattern: &str, key: &str| redis_pattern(pattern).is_some_and(|p| p.matches(key));

        assert!(matches("h[^e]llo", "hallo"));
        assert!(!matches("h[^e]llo", "hello"));
        assert!(matches("h[ae]llo", "hello"));
        assert!(matches("a\\*b", "a*b"));
        assert!(!matches("a\\*b", "axxb"));
        assert!(matches("q\\?", "q?"));
        assert!(matches("user:**", "user:1/profile"));
        assert!(matches("path/*", "path/a/b"));
        assert!(!matches("[", "["));
    }

    #[tokio::test]
    async fn test_expire_non_positive_deletes() {
        let store = MemoryStore::new();
        store.set("a", "v").await.unwrap();
        store.set("b", "v").await.unwrap();

        assert!(store.expire("a", 0).await.unwrap());
        assert!(store.expire("b", -10).await.unwrap());
        assert!(!store.expire("b", -10).await.unwrap());
        assert_eq!(store.dbsize().await.unwrap(), 0);
        assert_eq!(
            store.execute("EXPIRE", &strings(&["a", "-1"])).await.unwrap(),
            json!(0)
        );
    }

    #[tokio::test]
    async fn test_scan_pages_through_all_keys() {
        let store = MemoryStore::new();
        for i in 0..25 {
            store.set(&format!("k{i:02}"), "v").await.unwrap();
        }

        let (cursor, first) = store.scan(0, "*", 10).await.unwrap();
        assert_eq!(cursor, 10);
        assert_eq!(first.len(), 10);

        let (cursor, second) = store.scan(cursor, "*", 10).await.unwrap();
        let (cursor, third) = store.scan(cursor, "*", 10).await.unwrap();
        assert_eq!(cursor, 0);
        assert_eq!(second.len() + third.len(), 15);
    }

    #[tokio::test]
    async fn test_flushdb_and_flushall() {
        let store = MemoryStore::new();
        let other = store.select(1).unwrap();
        store.set("a", "1").await.unwrap();
        other.set("b", "2").await.unwrap();

        store.flushdb().await.unwrap();
        assert_eq!(store.dbsize().await.unwrap(), 0);
        assert_eq!(other.dbsize().await.unwrap(), 1);

        store.flushall().await.unwrap();
        assert_eq!(other.dbsize().await.unwrap(), 0);
        assert!(store.select(DATABASES).is_err());
    }

    #[tokio::test]
    async fn test_info_sections() {
        let store = MemoryStore::new();
        store.set("a", "12345").await.unwrap();
        let _ = store.get("a").await.unwrap();
        let _ = store.get("missing").await.unwrap();

        let info = store.info(None).await.unwrap();
        assert_eq!(info.parsed::<u64>("connected_clients"), Some(1));
        assert_eq!(info.parsed::<u64>("used_memory"), Some(6));
        assert_eq!(info.parsed::<u64>("keyspace_hits"), Some(1));
        assert_eq!(info.parsed::<u64>("keyspace_misses"), Some(1));
        assert_eq!(info.get("db0"), Some("keys=1,expires=0,avg_ttl=0"));

        let memory = store.info(Some("memory")).await.unwrap();
        assert!(memory.get("used_memory_human").is_some());
        assert!(memory.get("connected_clients").is_none());
    }

    #[tokio::test]
    async fn test_execute_commands() {
        let store = MemoryStore::new();

        assert_eq!(store.execute("PING", &[]).await.unwrap(), json!("PONG"));
        assert_eq!(
            store.execute("SET", &strings(&["k", "v"])).await.unwrap(),
            json!("OK")
        );
        assert_eq!(
            store.execute("get", &strings(&["k"])).await.unwrap(),
            json!("v")
        );
        assert_eq!(
            store.execute("KEYS", &strings(&["*"])).await.unwrap(),
            json!(["k"])
        );
        assert_eq!(
            store.execute("EXISTS", &strings(&["k", "zz"])).await.unwrap(),
            json!(1)
        );
        assert_eq!(store.execute("DBSIZE", &[]).await.unwrap(), json!(1));
        assert_eq!(
            store.execute("GET", &strings(&["zz"])).await.unwrap(),
            serde_json::Value::Null
        );
    }

    #[tokio::test]
    async fn test_execute_errors() {
        let store = MemoryStore::new();

        let err = store.execute("GET", &[]).await.unwrap_err();
        assert!(err.to_string().contains("wrong number of arguments for 'get'"));

        let err = store.execute("NOPE", &strings(&["x"])).await.unwrap_err();
        assert!(err.to_string().contains("unknown command 'NOPE'"));

        let err = store
            .execute("EXPIRE", &strings(&["k", "soon"]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not an integer"));
    }

    #[tokio::test]
    async fn test_command_counter() {
        let store = MemoryStore::new();
        store.ping().await.unwrap();
        store.set("a", "b").await.unwrap();
        assert_eq!(store.stats().await.total_commands_processed, 2);
    }
}
