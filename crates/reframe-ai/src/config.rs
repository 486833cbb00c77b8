//! Pipeline configuration.
//!
//! Everything the pipeline needs is passed in explicitly; there is no
//! process-wide device or thread state.

use crate::bbox;
use crate::error::{AiError, AiResult};
use reframe_core::{working_frame, FrameRate, FrameSize, ReframeError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the reframing pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReframeConfig {
    /// Frames between the starts of consecutive windows.
    pub step_size: usize,
    /// Frames per saliency window.
    pub temporal_len: usize,
    /// Median filter kernel applied to centroids (must be odd).
    pub kernel_size: usize,
    /// Initial binary threshold on the 8-bit saliency map.
    pub min_intensity: u8,
    /// Lowest threshold tried before giving up on a window.
    pub min_intensity_floor: u8,
    /// Amount the threshold drops per retry.
    pub intensity_step: u8,
    /// Max distance in pixels between consecutive centroids of one cluster.
    pub cluster_threshold: f64,
    /// Max distance between adjacent cluster medians to interpolate between them.
    pub smoothing_threshold: f64,
    /// Scenes shorter than this many seconds are merged into a neighbour.
    pub min_scene_len: f64,
    /// Per-frame horizontal movement counted as directional motion.
    pub min_change: f64,
    /// Accumulated movement that forces a new turning point.
    pub max_drift: f64,
    /// Gaussian blur sigma applied to saliency maps.
    pub blur_sigma: f64,
    /// Width frames are decoded at.
    pub decode_width: u32,
    /// Height frames are decoded at.
    pub decode_height: u32,
    /// Width over height of the working buffer crops are projected into.
    pub working_aspect: f64,
    /// Extend the last detected scene to the end of the video.
    pub include_last_scene: bool,
    /// Shot-boundary detection settings.
    pub scene_detect: AdaptiveDetectConfig,
}

impl Default for ReframeConfig {
    fn default() -> Self {
        Self {
            step_size: 32,
            temporal_len: working_frame::TEMPORAL_LEN,
            kernel_size: 3,
            min_intensity: 50,
            min_intensity_floor: 0,
            intensity_step: 5,
            cluster_threshold: 40.0,
            smoothing_threshold: 10.0,
            min_scene_len: 1.0,
            min_change: 0.15,
            max_drift: 0.5,
            blur_sigma: 7.0,
            decode_width: working_frame::DECODE_WIDTH,
            decode_height: working_frame::DECODE_HEIGHT,
            working_aspect: working_frame::WORKING_ASPECT,
            include_last_scene: true,
            scene_detect: AdaptiveDetectConfig::default(),
        }
    }
}

impl ReframeConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> AiResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            AiError::Reframe(ReframeError::Serialization(format!("Invalid config: {e}")))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check every parameter before any frame is decoded.
    pub fn validate(&self) -> AiResult<()> {
        if self.temporal_len == 0 {
            return Err(AiError::invalid("temporal_len must be at least 1"));
        }
        if self.step_size == 0 || self.step_size > self.temporal_len {
            return Err(AiError::invalid(format!(
                "step_size must be in 1..={}, got {}",
                self.temporal_len, self.step_size
            )));
        }
        if self.kernel_size % 2 == 0 {
            return Err(AiError::invalid(format!(
                "kernel_size must be odd, got {}",
                self.kernel_size
            )));
        }
        if self.min_intensity_floor > self.min_intensity {
            return Err(AiError::invalid(format!(
                "min_intensity_floor ({}) exceeds min_intensity ({})",
                self.min_intensity_floor, self.min_intensity
            )));
        }
        if self.intensity_step == 0 {
            return Err(AiError::invalid("intensity_step must be at least 1"));
        }
        for (name, value) in [
            ("cluster_threshold", self.cluster_threshold),
            ("smoothing_threshold", self.smoothing_threshold),
            ("min_scene_len", self.min_scene_len),
            ("min_change", self.min_change),
            ("max_drift", self.max_drift),
            ("blur_sigma", self.blur_sigma),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AiError::invalid(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        if self.decode_width == 0 || self.decode_height == 0 {
            return Err(AiError::invalid("decode size must be non-zero"));
        }
        if !self.working_aspect.is_finite() || self.working_aspect <= 0.0 {
            return Err(AiError::invalid(format!(
                "working_aspect must be positive, got {}",
                self.working_aspect
            )));
        }
        bbox::check_landscape(self.working_size())?;
        self.scene_detect.validate()
    }

    /// Working buffer crops are projected into (224x398 by default).
    pub fn working_size(&self) -> FrameSize {
        FrameSize::from_height_and_aspect(self.decode_height as f64, self.working_aspect)
    }

    /// Minimum scene length converted to frames at `rate`.
    pub fn min_scene_len_frames(&self, rate: FrameRate) -> u64 {
        rate.seconds_to_frames(self.min_scene_len)
    }
}

/// Settings for the adaptive content detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveDetectConfig {
    /// Ratio of a frame's score to its neighbourhood mean that marks a cut.
    pub adaptive_threshold: f64,
    /// Minimum raw content score (0-255) for a cut.
    pub min_content_val: f64,
    /// Frames on each side averaged for the neighbourhood mean.
    pub window_width: usize,
}

impl Default for AdaptiveDetectConfig {
    fn default() -> Self {
        Self {
            adaptive_threshold: 3.0,
            min_content_val: 15.0,
            window_width: 2,
        }
    }
}

impl AdaptiveDetectConfig {
    pub fn validate(&self) -> AiResult<()> {
        if !self.adaptive_threshold.is_finite() || self.adaptive_threshold <= 0.0 {
            return Err(AiError::invalid(format!(
                "adaptive_threshold must be positive, got {}",
                self.adaptive_threshold
            )));
        }
        if !self.min_content_val.is_finite() || self.min_content_val < 0.0 {
            return Err(AiError::invalid("min_content_val must be non-negative"));
        }
        if self.window_width == 0 {
            return Err(AiError::invalid("window_width must be at least 1"));
        }
        Ok(())
    }
}

/// Where inference runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Device {
    Cpu,
    Cuda,
    /// CUDA when available, CPU otherwise.
    #[default]
    Auto,
}

/// Settings for loading the saliency model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Explicit model file. When unset the model cache is consulted.
    pub model_path: Option<PathBuf>,
    pub device: Device,
    /// Intra-op thread count for the inference runtime.
    pub intra_threads: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            device: Device::Auto,
            intra_threads: num_cpus::get(),
        }
    }
}
