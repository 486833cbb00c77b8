//! ONNX Runtime saliency backend.
//!
//! Gated behind the `onnx` feature flag. The ONNX Runtime shared library is
//! loaded at runtime.

use crate::config::{Device, ModelConfig};
use crate::error::{AiError, AiResult};
use crate::model_manager::{ModelId, ModelManager};
use crate::saliency::{window_to_tensor_data, Heatmap, SaliencyModel};
use crate::window::Window;
use ndarray::Array5;
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use ort::value::Tensor;
use std::fmt::Display;
use std::path::Path;
use tracing::{debug, info, warn};

fn ort_error<E: Display>(context: &'static str) -> impl FnOnce(E) -> AiError {
    move |e| AiError::InferenceError(format!("{context}: {e}"))
}

/// A loaded video saliency network.
///
/// Input is one window as `[1, 3, T, H, W]` floats in `[-1, 1]`; output is
/// a map whose last two dimensions are `H' x W'`.
pub struct OnnxSaliencyModel {
    session: Session,
    model_id: ModelId,
}

impl OnnxSaliencyModel {
    /// Load a model from a file path.
    pub fn load(model_path: &Path, model_id: ModelId, config: &ModelConfig) -> AiResult<Self> {
        info!(model = ?model_id, path = %model_path.display(), device = ?config.device, "Loading ONNX session");

        let builder = Session::builder()
            .map_err(ort_error("Failed to create session builder"))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(ort_error("Failed to set optimization level"))?
            .with_intra_threads(config.intra_threads.max(1))
            .map_err(ort_error("Failed to set intra-op threads"))?;

        let session = commit(builder, model_path, config.device)?;
        info!(model = ?model_id, "ONNX session loaded successfully");
        Ok(Self { session, model_id })
    }

    /// Resolve the model through `manager` and load it.
    pub fn from_cache(manager: &ModelManager, config: &ModelConfig) -> AiResult<Self> {
        let model_id = ModelId::Tased;
        let path = manager.resolve(config, model_id)?;
        Self::load(&path, model_id, config)
    }

    pub fn model_id(&self) -> ModelId {
        self.model_id
    }
}

fn commit(builder: SessionBuilder, model_path: &Path, device: Device) -> AiResult<Session> {
    if device != Device::Cpu {
        let cuda = builder
            .clone()
            .with_execution_providers([CUDAExecutionProvider::default().build()])
            .map_err(ort_error("Failed to register CUDA"))
            .and_then(|b| {
                b.commit_from_file(model_path)
                    .map_err(ort_error("Failed to load ONNX model"))
            });
        match (cuda, device) {
            (Ok(session), _) => {
                info!("Using CUDA execution provider for saliency");
                return Ok(session);
            }
            (Err(e), Device::Cuda) => return Err(e),
            (Err(e), _) => debug!(error = %e, "CUDA execution provider not available, using CPU"),
        }
    }

    builder
        .commit_from_file(model_path)
        .map_err(ort_error("Failed to load ONNX model"))
}

impl SaliencyModel for OnnxSaliencyModel {
    fn infer(&mut self, window: &Window) -> AiResult<Heatmap> {
        let (width, height) = window.dimensions();
        let dims = (1, 3, window.len(), height as usize, width as usize);
        let input = Array5::from_shape_vec(dims, window_to_tensor_data(window)?)
            .map_err(|e| AiError::InferenceError(format!("window does not fit {dims:?}: {e}")))?;
        let input = Tensor::from_array(input).map_err(ort_error("Failed to create tensor"))?;

        let outputs = self
            .session
            .run(ort::inputs![input])
            .map_err(ort_error("ONNX inference failed"))?;
        let map = outputs[0]
            .try_extract_array::<f32>()
            .map_err(ort_error("Failed to extract tensor"))?;

        let shape = map.shape();
        let [.., h, w] = *shape else {
            return Err(AiError::InferenceError(format!(
                "saliency output must be at least 2-D, got {shape:?}"
            )));
        };
        let plane = h * w;
        if map.len() != plane {
            warn!(shape = ?shape, "Saliency output has extra leading planes, keeping the last");
        }
        let values: Vec<f32> = map.iter().skip(map.len().saturating_sub(plane)).copied().collect();
        Heatmap::new(w as u32, h as u32, values).map(Heatmap::clamp_unit)
    }

    fn temporal_len(&self) -> Option<usize> {
        Some(self.model_id.spec().temporal_len)
    }
}
