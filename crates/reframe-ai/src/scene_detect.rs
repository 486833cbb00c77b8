//! Scene segmentation.
//!
//! Detects shot boundaries with an adaptive content detector and turns them
//! into an ordered, gap-free list of scenes. Works without any model.

use crate::config::{AdaptiveDetectConfig, ReframeConfig};
use crate::error::{AiError, AiResult};
use reframe_core::{FrameBuffer, FrameRate, ReframeError};
use reframe_media::FrameSource;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// A contiguous shot of the video, `[start_frame, end_frame)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub start_frame: u64,
    pub end_frame: u64,
    /// Start in seconds.
    pub start_time: f64,
    /// End in seconds.
    pub end_time: f64,
}

impl Scene {
    pub fn new(start_frame: u64, end_frame: u64, rate: FrameRate) -> Self {
        Self {
            start_frame,
            end_frame,
            start_time: rate.frames_to_seconds(start_frame),
            end_time: rate.frames_to_seconds(end_frame),
        }
    }

    /// Frames in the scene; 0 when the bounds are inverted.
    pub fn frame_count(&self) -> u64 {
        self.end_frame.saturating_sub(self.start_frame)
    }
}

/// Finds shot boundaries in a frame stream.
pub trait SceneDetector {
    /// Read `source` to the end and return `(start, end)` frame ranges of
    /// the detected scenes, or an empty list when there is no cut.
    fn detect(
        &mut self,
        source: &mut dyn FrameSource,
        min_scene_len: u64,
    ) -> AiResult<Vec<(u64, u64)>>;
}

/// Cut detector comparing each frame's change against its neighbourhood.
///
/// A frame starts a new scene when its content score is both large in
/// absolute terms and several times the mean score of the surrounding
/// frames, which keeps fast camera motion from registering as cuts.
#[derive(Debug, Clone, Default)]
pub struct AdaptiveDetector {
    config: AdaptiveDetectConfig,
}

impl AdaptiveDetector {
    pub fn new(config: AdaptiveDetectConfig) -> Self {
        Self { config }
    }

    /// Cut frames for a precomputed per-frame score series.
    ///
    /// `scores[i]` is the change from frame `i - 1` to frame `i`.
    pub fn cuts_from_scores(&self, scores: &[f64], min_scene_len: u64) -> Vec<u64> {
        let ww = self.config.window_width;
        let mut cuts = Vec::new();
        if scores.len() < 2 * ww + 1 {
            return cuts;
        }

        let mut last_cut = 0u64;
        for i in ww..scores.len() - ww {
            let score = scores[i];
            let neighbours = scores[i - ww..i]
                .iter()
                .chain(&scores[i + 1..=i + ww])
                .sum::<f64>()
                / (2 * ww) as f64;

            let ratio = if neighbours > 1e-5 {
                score / neighbours
            } else if score >= self.config.min_content_val {
                255.0
            } else {
                0.0
            };

            let frame = i as u64;
            if ratio >= self.config.adaptive_threshold
                && score >= self.config.min_content_val
                && frame - last_cut >= min_scene_len
            {
                debug!(frame, score, ratio, "Scene cut detected");
                cuts.push(frame);
                last_cut = frame;
            }
        }
        cuts
    }
}

impl SceneDetector for AdaptiveDetector {
    fn detect(
        &mut self,
        source: &mut dyn FrameSource,
        min_scene_len: u64,
    ) -> AiResult<Vec<(u64, u64)>> {
        let start = source.position();
        let mut scores = Vec::with_capacity(source.frame_count().unwrap_or(0) as usize);
        let mut previous: Option<FrameBuffer> = None;

        while let Some(frame) = source.next_frame()? {
            let score = match &previous {
                Some(prev) => content_score(prev, &frame).ok_or_else(|| {
                    AiError::Reframe(ReframeError::Decoder(format!(
                        "frame {} changed size mid-stream",
                        start + scores.len() as u64
                    )))
                })?,
                None => 0.0,
            };
            scores.push(score);
            previous = Some(frame);
        }

        let cuts = self.cuts_from_scores(&scores, min_scene_len);
        debug!(frames = scores.len(), cuts = cuts.len(), "Content scan finished");
        if cuts.is_empty() {
            return Ok(Vec::new());
        }

        let end = start + scores.len() as u64;
        let bounds: Vec<u64> = std::iter::once(start)
            .chain(cuts.into_iter().map(|c| start + c))
            .chain(std::iter::once(end))
            .collect();
        Ok(bounds.windows(2).map(|b| (b[0], b[1])).collect())
    }
}

/// Mean absolute RGB difference between two frames on a 0-255 scale.
///
/// Returns `None` when the frames differ in size or format.
pub fn content_score(a: &FrameBuffer, b: &FrameBuffer) -> Option<f64> {
    if a.width != b.width || a.height != b.height || a.format != b.format {
        return None;
    }
    let bpp = a.format.bytes_per_pixel();
    let channels = bpp.min(3);
    let samples = a.width as u64 * a.height as u64 * channels as u64;
    if samples == 0 {
        return Some(0.0);
    }

    let mut total: u64 = 0;
    for y in 0..a.height {
        let (ra, rb) = (a.plane().row(y), b.plane().row(y));
        for (pa, pb) in ra.chunks_exact(bpp).zip(rb.chunks_exact(bpp)) {
            for c in 0..channels {
                total += pa[c].abs_diff(pb[c]) as u64;
            }
        }
    }
    Some(total as f64 / samples as f64)
}

/// Turn detected ranges into scenes covering the whole video.
///
/// No detections become a single scene `[0, total_frames)`. With
/// `include_last`, a final scene that stops short of `total_frames` is
/// extended to it. An unknown frame count leaves the detected bounds as
/// they are, and is fatal only when nothing was detected.
pub fn segment_scenes(
    detected: &[(u64, u64)],
    total_frames: Option<u64>,
    rate: FrameRate,
    include_last: bool,
) -> AiResult<Vec<Scene>> {
    if total_frames == Some(0) {
        return Err(ReframeError::Media("video has no frames".into()).into());
    }

    if detected.is_empty() {
        let total = total_frames.ok_or_else(|| {
            ReframeError::Media(
                "no scenes detected and the video's frame count is unknown".into(),
            )
        })?;
        warn!(total, "No scene cuts detected, using the whole video as one scene");
        return Ok(vec![Scene::new(0, total, rate)]);
    }

    let mut expected_start = 0;
    for &(start, end) in detected {
        if start != expected_start || end <= start {
            return Err(AiError::invalid(format!(
                "detected scenes must tile the video from frame 0, got ({start}, {end}) after frame {expected_start}"
            )));
        }
        expected_start = end;
    }

    let mut scenes: Vec<Scene> = detected
        .iter()
        .map(|&(start, end)| Scene::new(start, end, rate))
        .collect();

    if include_last {
        match (total_frames, scenes.last_mut()) {
            (Some(total), Some(last)) if total > last.end_frame => {
                debug!(from = last.end_frame, to = total, "Extending last scene to the end of the video");
                *last = Scene::new(last.start_frame, total, rate);
            }
            (None, _) => warn!("Frame count unknown, keeping the last detected scene boundary"),
            _ => {}
        }
    }

    Ok(scenes)
}

/// Run `detector` over `source` and segment the result.
///
/// `total_frames` is the container's frame count when known; otherwise the
/// number of frames the detector read is used.
pub fn detect_scenes(
    source: &mut dyn FrameSource,
    detector: &mut dyn SceneDetector,
    total_frames: Option<u64>,
    config: &ReframeConfig,
) -> AiResult<Vec<Scene>> {
    let rate = source.frame_rate();
    let min_scene_len = config.min_scene_len_frames(rate);
    let detected = detector.detect(source, min_scene_len)?;

    let total = total_frames.or_else(|| {
        let scanned = source.position();
        warn!(scanned, "Frame count unknown, using the number of frames scanned");
        (scanned > 0).then_some(scanned)
    });

    let scenes = segment_scenes(&detected, total, rate, config.include_last_scene)?;
    info!(scenes = scenes.len(), frames = ?total, "Scene segmentation complete");
    Ok(scenes)
}

/// Helper to create an RGB solid-color frame for testing.
#[cfg(test)]
fn make_solid_frame(width: u32, height: u32, v: u8) -> FrameBuffer {
    FrameBuffer::solid(width, height, [v, v, v])
}
