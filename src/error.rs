//! Error types for the admin server
//!
//! Every failure surfaces to HTTP clients as `{"error": "..."}`.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use deadpool_redis::{redis::RedisError, CreatePoolError, PoolError};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Admin Error Enum ==
/// Unified error type for the admin server and the key stores.
#[derive(Error, Debug)]
pub enum AdminError {
    /// Malformed or unusable request input
    #[error("{0}")]
    InvalidRequest(String),

    /// Command refused by safe mode
    #[error("{0}")]
    Forbidden(String),

    /// Error reported by the Redis server or client
    #[error("{0}")]
    Redis(String),

    /// No connection could be taken from the pool
    #[error("Connection pool error: {0}")]
    Pool(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AdminError {
    /// HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            AdminError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AdminError::Forbidden(_) => StatusCode::FORBIDDEN,
            AdminError::Redis(_) | AdminError::Pool(_) | AdminError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// == Conversions ==
impl From<RedisError> for AdminError {
    fn from(err: RedisError) -> Self {
        AdminError::Redis(err.to_string())
    }
}

impl From<PoolError> for AdminError {
    fn from(err: PoolError) -> Self {
        AdminError::Pool(err.to_string())
    }
}

impl From<CreatePoolError> for AdminError {
    fn from(err: CreatePoolError) -> Self {
        AdminError::Pool(err.to_string())
    }
}

impl From<JsonRejection> for AdminError {
    fn from(rejection: JsonRejection) -> Self {
        AdminError::InvalidRequest(rejection.body_text())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the admin server.
pub type Result<T> = std::result::Result<T, AdminError>;
