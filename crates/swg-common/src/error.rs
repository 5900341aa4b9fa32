//! Error types for the secure web gateway

use std::path::PathBuf;
use thiserror::Error;

/// Gateway error type
///
/// Only setup and reload paths return these. Request evaluation never fails;
/// every problem there is reported as a reason string instead.
#[derive(Error, Debug)]
pub enum SwgError {
    /// Policy document could not be read
    #[error("failed to read policy document at {path}: {source}")]
    PolicyLoad {
        /// Path of the document
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Policy document was read but could not be parsed
    #[error("invalid policy: {0}")]
    InvalidPolicy(String),

    /// Configuration error
    #[error("config error: {0}")]
    Config(String),

    /// Audit sink error
    #[error("audit sink error: {0}")]
    Sink(String),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the gateway
pub type SwgResult<T> = Result<T, SwgError>;
