//! API Module
//!
//! HTTP handlers and routing for the Redis admin console.
//!
//! # Endpoints
//! - `GET /redis-admin` - Admin page
//! - `GET /redis-admin/api/stats` - Server statistics
//! - `GET /redis-admin/api/keys` - List keys by pattern
//! - `GET|DELETE /redis-admin/api/key/*key` - Read or delete one key
//! - `POST /redis-admin/api/key` - Write a key
//! - `POST /redis-admin/api/execute` - Run a raw command
//! - `POST /redis-admin/api/flush-db` - Flush the current database
//! - `POST /redis-admin/api/flush-all` - Flush every database
//! - `GET /redis-admin/health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
