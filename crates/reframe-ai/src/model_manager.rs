//! Saliency model cache.
//!
//! Model weights are not bundled. They are placed in a cache directory
//! (by default `<user cache>/reframe/models`) and resolved from there unless
//! a [`ModelConfig`] names an explicit file.

use crate::config::ModelConfig;
use crate::error::{AiError, AiResult};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Descriptor for a cached model file.
#[derive(Debug, Clone, Copy)]
pub struct ModelSpec {
    pub id: ModelId,
    /// Filename in the cache directory.
    pub filename: &'static str,
    /// Frames per input window the network was trained with.
    pub temporal_len: usize,
}

/// Identifies a saliency network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelId {
    /// TASED-Net video saliency, exported to ONNX.
    Tased,
}

impl ModelId {
    pub fn spec(&self) -> ModelSpec {
        match self {
            Self::Tased => ModelSpec {
                id: *self,
                filename: "tased.onnx",
                temporal_len: 32,
            },
        }
    }
}

/// Locates model files on disk.
pub struct ModelManager {
    cache_dir: PathBuf,
}

impl ModelManager {
    /// Create a new model manager with the given cache directory.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Manager over the per-user cache directory.
    pub fn with_default_cache() -> AiResult<Self> {
        Self::default_cache_dir()
            .map(Self::new)
            .ok_or_else(|| AiError::invalid("no user cache directory on this platform"))
    }

    /// `<user cache>/reframe/models`, when the platform has a cache dir.
    pub fn default_cache_dir() -> Option<PathBuf> {
        dirs::cache_dir().map(|d| d.join("reframe").join("models"))
    }

    /// Path to the cached model. Creates the cache directory when missing so
    /// the file can be dropped in, and fails if the model is not there yet.
    pub fn ensure_model(&self, model: ModelId) -> AiResult<PathBuf> {
        let local_path = self.model_path(model);

        if local_path.is_file() {
            debug!(model = ?model, path = %local_path.display(), "Model already cached");
            return Ok(local_path);
        }

        std::fs::create_dir_all(&self.cache_dir)?;
        warn!(
            model = ?model,
            path = %local_path.display(),
            "Model not cached, place the weights at this path"
        );
        Err(AiError::ModelNotFound {
            model_id: format!("{model:?} ({})", local_path.display()),
        })
    }

    /// Model file for `config`: its explicit path when set, otherwise the
    /// cached copy of `model`.
    pub fn resolve(&self, config: &ModelConfig, model: ModelId) -> AiResult<PathBuf> {
        match &config.model_path {
            Some(path) if path.is_file() => {
                info!(path = %path.display(), "Using configured model file");
                Ok(path.clone())
            }
            Some(path) => Err(AiError::ModelNotFound {
                model_id: path.display().to_string(),
            }),
            None => self.ensure_model(model),
        }
    }

    /// Check if a model is already cached locally.
    pub fn is_cached(&self, model: ModelId) -> bool {
        self.model_path(model).is_file()
    }

    /// Get the local path for a model (may not exist yet).
    pub fn model_path(&self, model: ModelId) -> PathBuf {
        self.cache_dir.join(model.spec().filename)
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }
}
