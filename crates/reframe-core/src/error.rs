//! Error types for the reframing pipeline.

use thiserror::Error;

/// Main error type for reframing operations.
#[derive(Error, Debug)]
pub enum ReframeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Media error: {0}")]
    Media(String),

    #[error("Decoder error: {0}")]
    Decoder(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for reframing operations.
pub type Result<T> = std::result::Result<T, ReframeError>;
