//! Redis Admin - A web console for a Redis instance

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use redis_admin::{create_router, AppState, Config, KeyStore, RedisStore};

/// Main entry point for the Redis admin server.
///
/// # Startup Sequence
/// 1. Load configuration from environment variables
/// 2. Initialize tracing (debug level when `REDIS_ADMIN_DEBUG=true`)
/// 3. Build the Redis connection pool and ping the server
/// 4. Serve the router on the configured port
/// 5. Shut down gracefully on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    let default_filter = if config.debug {
        "redis_admin=debug,tower_http=debug"
    } else {
        "redis_admin=info,tower_http=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Redis Admin");
    info!(
        "Configuration loaded: redis={}:{} db={}, port={}, safe_mode={}, pool_size={}",
        config.redis_host,
        config.redis_port,
        config.redis_db,
        config.server_port,
        config.safe_mode,
        config.pool_size
    );

    let store = RedisStore::connect(&config).context("failed to create Redis pool")?;
    // The pool reconnects lazily, so an unreachable server is not fatal here
    match store.ping().await {
        Ok(()) => info!("Redis is reachable"),
        Err(err) => warn!("Redis is not reachable yet: {err}"),
    }

    let state = AppState::new(Arc::new(store), config.safe_mode);
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}/redis-admin", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
