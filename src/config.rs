//! Configuration Module
//!
//! Handles loading the admin server configuration from environment variables.

use std::env;
use std::str::FromStr;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Redis server host
    pub redis_host: String,
    /// Redis server port
    pub redis_port: u16,
    /// Redis logical database index
    pub redis_db: i64,
    /// HTTP server port
    pub server_port: u16,
    /// Verbose logging
    pub debug: bool,
    /// Deny administrative commands on the execute endpoint
    pub safe_mode: bool,
    /// Maximum number of pooled Redis connections
    pub pool_size: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `REDIS_SERVER_HOST` - Redis host (default: localhost)
    /// - `REDIS_SERVER_PORT` - Redis port (default: 6379)
    /// - `REDIS_SERVER_DB` - Redis database index (default: 0)
    /// - `REDIS_ADMIN_PORT` - HTTP server port (default: 8888)
    /// - `REDIS_ADMIN_DEBUG` - `true` for debug logging (default: false)
    /// - `REDIS_ADMIN_SAFE_MODE` - `true` to block admin commands (default: false)
    /// - `REDIS_ADMIN_POOL_SIZE` - Pooled connections (default: 16)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_host: env::var("REDIS_SERVER_HOST").unwrap_or(defaults.redis_host),
            redis_port: parse_var("REDIS_SERVER_PORT").unwrap_or(defaults.redis_port),
            redis_db: parse_var("REDIS_SERVER_DB").unwrap_or(defaults.redis_db),
            server_port: parse_var("REDIS_ADMIN_PORT").unwrap_or(defaults.server_port),
            debug: flag_var("REDIS_ADMIN_DEBUG"),
            safe_mode: flag_var("REDIS_ADMIN_SAFE_MODE"),
            pool_size: parse_var("REDIS_ADMIN_POOL_SIZE").unwrap_or(defaults.pool_size),
        }
    }

    /// Connection URL for the configured Redis server.
    pub fn redis_url(&self) -> String {
        format!(
            "redis://{}:{}/{}",
            self.redis_host, self.redis_port, self.redis_db
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_host: "localhost".to_string(),
            redis_port: 6379,
            redis_db: 0,
            server_port: 8888,
            debug: false,
            safe_mode: false,
            pool_size: 16,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// Only the literal `true` (any case) enables a flag.
fn flag_var(name: &str) -> bool {
    env::var(name)
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
