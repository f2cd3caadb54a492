//! API Routes
//!
//! Configures the Axum router with all admin endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_key_handler, execute_handler, flush_all_handler, flush_db_handler, get_key_handler,
    health_handler, index_handler, keys_handler, set_key_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// Keys in `/redis-admin/api/key/*key` may contain `/`.
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/stats", get(stats_handler))
        .route("/keys", get(keys_handler))
        .route("/key", post(set_key_handler))
        .route("/key/*key", get(get_key_handler).delete(delete_key_handler))
        .route("/execute", post(execute_handler))
        .route("/flush-db", post(flush_db_handler))
        .route("/flush-all", post(flush_all_handler));

    Router::new()
        .route("/", get(index_handler))
        .route("/redis-admin", get(index_handler))
        .route("/redis-admin/health", get(health_handler))
        .nest("/redis-admin/api", api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
