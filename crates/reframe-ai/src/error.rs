//! Error types for the reframing pipeline.

use reframe_core::ReframeError;
use thiserror::Error;

/// Errors that can occur while computing reframing tracks.
#[derive(Debug, Error)]
pub enum AiError {
    /// The saliency model file is not in the cache.
    #[error("Model not found: {model_id}")]
    ModelNotFound { model_id: String },

    /// ONNX Runtime error.
    #[cfg(feature = "onnx")]
    #[error("ONNX Runtime error: {0}")]
    OnnxError(#[from] ort::Error),

    /// The model produced a map of an unexpected shape.
    #[error("Inference error: {0}")]
    InferenceError(String),

    /// No salient component was found even at the lowest intensity threshold.
    #[error("No salient region above intensity {floor} in window {window}")]
    ExtractionExhausted { window: usize, floor: u8 },

    /// The caller cancelled the run between scenes.
    #[error("Reframing cancelled after {completed} of {total} scenes")]
    Cancelled { completed: usize, total: usize },

    /// Media, geometry or parameter error from the lower layers.
    #[error(transparent)]
    Reframe(#[from] ReframeError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AiError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::Reframe(ReframeError::InvalidParameter(msg.into()))
    }
}

/// Result type alias for AI operations.
pub type AiResult<T> = std::result::Result<T, AiError>;
