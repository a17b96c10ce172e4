//! Error types for the encrypted cache
//!
//! Provides unified error handling using thiserror. Lower layers (crypto,
//! storage, codecs) report narrow errors; the engine wraps them with the key
//! and phase they occurred in.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Unsupported encryption type or cipher, missing or malformed key material
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Key cannot be mapped onto a storage name
    #[error("Invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// Storage read, write or delete failure
    #[error("I/O error while {op} '{key}': {source}")]
    Io {
        op: &'static str,
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Cipher refused to seal the payload
    #[error("Encryption failed for key '{key}'")]
    Encryption { key: String },

    /// Authentication tag mismatch or malformed ciphertext
    #[error("Decryption failed for key '{key}': {reason}")]
    Decryption { key: String, reason: String },

    /// Serialization, compression or envelope parsing failure
    #[error("Codec error while {phase} '{key}': {message}")]
    Codec {
        phase: &'static str,
        key: String,
        message: String,
    },

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Blocking engine task panicked or was cancelled
    #[error("Cache task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl CacheError {
    /// Wraps an I/O error with the operation and key it belongs to.
    pub fn io(op: &'static str, key: impl Into<String>, source: std::io::Error) -> Self {
        CacheError::Io {
            op,
            key: key.into(),
            source,
        }
    }

    /// Wraps a codec failure with the phase and key it belongs to.
    pub fn codec(phase: &'static str, key: impl Into<String>, err: impl std::fmt::Display) -> Self {
        CacheError::Codec {
            phase,
            key: key.into(),
            message: err.to_string(),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) | CacheError::InvalidKey { .. } => {
                StatusCode::BAD_REQUEST
            }
            CacheError::Configuration(_)
            | CacheError::Io { .. }
            | CacheError::Encryption { .. }
            | CacheError::Decryption { .. }
            | CacheError::Codec { .. }
            | CacheError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
