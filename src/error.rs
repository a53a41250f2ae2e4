//! Error types for the cache
//!
//! Storage backends report failures through `CacheError`. The cache service
//! absorbs them (fail open); only the admin API surfaces them as responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache and its admin API.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Persistent store failed to read or write
    #[error("Storage error: {0}")]
    Storage(String),

    /// Entry could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem failure in the file store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// SQLite failure in the file store
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A blocking cache task panicked or was cancelled
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Storage(_)
            | CacheError::Serialization(_)
            | CacheError::Io(_)
            | CacheError::Sqlite(_)
            | CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
