//! API Handlers
//!
//! HTTP request handlers for each admin endpoint. Each one forwards to one or
//! two `KeyStore` calls.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use tracing::{info, warn};

use crate::error::{AdminError, Result};
use crate::models::{
    DeleteResponse, ExecuteRequest, ExecuteResponse, HealthResponse, KeyDetailResponse,
    KeyListResponse, KeySummary, KeysQuery, SetKeyRequest, StatsResponse, SuccessResponse,
};
use crate::store::{read_value, scan_keys, write_value, KeyStore};

/// Commands the execute endpoint refuses while safe mode is on
pub const BLOCKED_COMMANDS: [&str; 7] = [
    "FLUSHALL",
    "FLUSHDB",
    "CONFIG",
    "SHUTDOWN",
    "BGREWRITEAOF",
    "BGSAVE",
    "SAVE",
];

const INDEX_PAGE: &str = include_str!("../../static/index.html");

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Backend every request is forwarded to
    pub store: Arc<dyn KeyStore>,
    /// Whether `BLOCKED_COMMANDS` are refused by the execute endpoint
    pub safe_mode: bool,
}

impl AppState {
    /// Creates a new AppState around the given store.
    pub fn new(store: Arc<dyn KeyStore>, safe_mode: bool) -> Self {
        Self { store, safe_mode }
    }

    /// True when `command` (upper-cased) must be refused.
    pub fn is_blocked(&self, command: &str) -> bool {
        self.safe_mode && BLOCKED_COMMANDS.contains(&command)
    }
}

/// Handler for GET / and GET /redis-admin
pub async fn index_handler() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

/// Handler for GET /redis-admin/api/stats
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let info = state.store.info(None).await?;
    let db_keys = state.store.dbsize().await?;

    Ok(Json(StatsResponse::from_info(&info, db_keys)))
}

/// Handler for GET /redis-admin/api/keys
///
/// Lists at most `limit` keys matching `pattern`, each with its type.
pub async fn keys_handler(
    State(state): State<AppState>,
    Query(query): Query<KeysQuery>,
) -> Result<Json<KeyListResponse>> {
    let limit = query.limit()?;
    let keys = scan_keys(state.store.as_ref(), query.pattern(), Some(limit)).await?;

    let mut summaries = Vec::with_capacity(keys.len());
    for key in keys {
        let key_type = state.store.key_type(&key).await?;
        summaries.push(KeySummary { key, key_type });
    }

    Ok(Json(KeyListResponse::new(summaries)))
}

/// Handler for GET /redis-admin/api/key/*key
pub async fn get_key_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<KeyDetailResponse>> {
    let key_type = state.store.key_type(&key).await?;
    let value = read_value(state.store.as_ref(), &key, &key_type).await?;
    let ttl = state.store.ttl(&key).await?;

    Ok(Json(KeyDetailResponse {
        key,
        key_type,
        value,
        ttl,
    }))
}

/// Handler for POST /redis-admin/api/key
pub async fn set_key_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SetKeyRequest>, JsonRejection>,
) -> Result<Json<SuccessResponse>> {
    let Json(req) = payload?;
    if let Some(error_msg) = req.validate() {
        return Err(AdminError::InvalidRequest(error_msg));
    }

    write_value(state.store.as_ref(), &req.key, &req.value, req.ttl).await?;

    Ok(Json(SuccessResponse::ok()))
}

/// Handler for DELETE /redis-admin/api/key/*key
pub async fn delete_key_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let deleted = state.store.del(&[key]).await?;

    Ok(Json(DeleteResponse::new(deleted)))
}

/// Handler for POST /redis-admin/api/execute
///
/// Splits the command line on whitespace and upper-cases the command name.
pub async fn execute_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ExecuteRequest>, JsonRejection>,
) -> Result<Json<ExecuteResponse>> {
    let Json(req) = payload?;
    let command = req.command.trim();

    let mut parts = command.split_whitespace();
    let Some(name) = parts.next() else {
        return Err(AdminError::InvalidRequest("No command provided".to_string()));
    };
    let name = name.to_ascii_uppercase();
    let args: Vec<String> = parts.map(str::to_string).collect();

    if state.is_blocked(&name) {
        warn!(command = %name, "command refused in safe mode");
        return Err(AdminError::Forbidden(format!(
            "Command {name} is blocked in safe mode"
        )));
    }

    info!(command = %name, args = args.len(), "executing command");
    let result = state.store.execute(&name, &args).await?;

    Ok(Json(ExecuteResponse {
        result,
        command: command.to_string(),
    }))
}

/// Handler for POST /redis-admin/api/flush-db
pub async fn flush_db_handler(State(state): State<AppState>) -> Result<Json<SuccessResponse>> {
    state.store.flushdb().await?;
    warn!("current database flushed");

    Ok(Json(SuccessResponse::ok()))
}

/// Handler for POST /redis-admin/api/flush-all
pub async fn flush_all_handler(State(state): State<AppState>) -> Result<Json<SuccessResponse>> {
    state.store.flushall().await?;
    warn!("all databases flushed");

    Ok(Json(SuccessResponse::ok()))
}

/// Handler for GET /redis-admin/health
///
/// 200 when Redis answers PING, 500 otherwise.
pub async fn health_handler(State(state): State<AppState>) -> Response {
    match state.store.ping().await {
        Ok(()) => Json(HealthResponse::healthy()).into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(HealthResponse::unhealthy(err.to_string())),
        )
            .into_response(),
    }
}
