//! Error types for incident clustering

use thiserror::Error;

/// Errors that can occur at the I/O-facing edges of the clustering pipeline
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Failed to parse alert payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid alert: {0}")]
    InvalidAlert(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
