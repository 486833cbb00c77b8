//! Reframe AI - saliency-guided auto-reframing
//!
//! Turns landscape video into portrait (9:16) and square (1:1) crop tracks:
//! - Scene segmentation (adaptive content detector)
//! - Windowed saliency inference (TASED-style model, ONNX behind `onnx`)
//! - Centroid extraction, median filtering and cluster smoothing
//! - Turning-point compression of the per-frame track
//! - Crop projection and short-scene merging

pub mod bbox;
pub mod centroid;
pub mod cluster;
pub mod config;
pub mod error;
pub mod model_manager;
pub mod pipeline;
pub mod post_process;
pub mod saliency;
pub mod scene_detect;
#[cfg(feature = "onnx")]
pub mod session;
pub mod smoothing;
pub mod turning_points;
pub mod window;

pub use bbox::{compute_portrait_from_hcenter, BBox, TargetAspect};
pub use config::{AdaptiveDetectConfig, Device, ModelConfig, ReframeConfig};
pub use error::{AiError, AiResult};
pub use model_manager::{ModelId, ModelManager};
pub use pipeline::{
    compute_portrait_square_bboxes_with_scenes, compute_with_progress, ReframeCancel,
    ReframeProgress, ReframeTracks, Reframer,
};
pub use saliency::{Heatmap, SaliencyModel};
pub use scene_detect::{detect_scenes, AdaptiveDetector, Scene, SceneDetector};
#[cfg(feature = "onnx")]
pub use session::OnnxSaliencyModel;
pub use window::{Window, WindowSampler};
