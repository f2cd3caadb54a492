//! Redis Admin - A web console for a Redis instance
//!
//! Serves a small JSON API (stats, key browsing, reads and writes, raw
//! commands, flushes) plus a single-page UI, and ships `cache_probe`, a
//! diagnostic for detection-result caching in Redis.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod probe;
pub mod store;

pub use api::{create_router, AppState};
pub use config::Config;
pub use error::{AdminError, Result};
pub use store::{KeyStore, MemoryStore, RedisStore};
