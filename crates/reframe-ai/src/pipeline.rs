//! Portrait and square reframing pipeline.
//!
//! Runs each scene through the stages in order:
//! 1. Window sampling with reversed priming
//! 2. Saliency inference, blur and centroid extraction
//! 3. Median filtering and cluster smoothing (scene track)
//! 4. Upsampling and turning points (tracking track)
//! 5. Projection to portrait and square boxes
//!
//! Scene tracks are post-processed once every scene is done. Progress is
//! reported per scene and cancellation is honoured only between scenes.

use crate::bbox::{self, BBox, TargetAspect};
use crate::centroid::CentroidExtractor;
use crate::cluster::{self, SmoothedSegment};
use crate::config::ReframeConfig;
use crate::error::{AiError, AiResult};
use crate::post_process::post_process_scene_bboxes;
use crate::saliency::{self, SaliencyModel};
use crate::scene_detect::{self, AdaptiveDetector, Scene};
use crate::smoothing;
use crate::turning_points::{compute_turning_points, TurningPointParams};
use crate::window::{self, WindowSampler};
use reframe_core::{FrameRate, Point2, ReframeError};
use reframe_media::{FrameSource, MediaProbe, PrefetchSource, VideoDecoder};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The four box tracks for one video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReframeTracks {
    /// One 1:1 box per scene.
    pub square_scene: Vec<BBox>,
    /// One 9:16 box per scene.
    pub portrait_scene: Vec<BBox>,
    /// 1:1 boxes between consecutive turning points.
    pub square_tracking: Vec<BBox>,
    /// 9:16 boxes between consecutive turning points.
    pub portrait_tracking: Vec<BBox>,
}

impl ReframeTracks {
    pub fn to_json(&self) -> AiResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ReframeError::Serialization(e.to_string()).into())
    }
}

/// `(square_scene, portrait_scene, square_tracking, portrait_tracking)`
impl From<ReframeTracks> for (Vec<BBox>, Vec<BBox>, Vec<BBox>, Vec<BBox>) {
    fn from(t: ReframeTracks) -> Self {
        (
            t.square_scene,
            t.portrait_scene,
            t.square_tracking,
            t.portrait_tracking,
        )
    }
}

/// Progress after a scene finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReframeProgress {
    /// Index of the scene just processed.
    pub scene_index: usize,
    pub scene_count: usize,
    /// Windows inferred for the scene; 0 when it was skipped.
    pub windows: usize,
}

impl ReframeProgress {
    /// Fraction of scenes done (0.0 to 1.0).
    pub fn fraction(&self) -> f32 {
        if self.scene_count == 0 {
            1.0
        } else {
            (self.scene_index + 1) as f32 / self.scene_count as f32
        }
    }
}

/// Shared flag that stops a run at the next scene boundary.
#[derive(Debug, Clone, Default)]
pub struct ReframeCancel(Arc<AtomicBool>);

impl ReframeCancel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Boxes produced for one scene.
#[derive(Debug, Default)]
struct SceneTracks {
    square_scene: Vec<BBox>,
    portrait_scene: Vec<BBox>,
    square_tracking: Vec<BBox>,
    portrait_tracking: Vec<BBox>,
}

/// Runs the per-scene stages over a frame source.
pub struct Reframer {
    config: ReframeConfig,
    cancel: Option<ReframeCancel>,
}

impl Reframer {
    /// Validate `config` and build a reframer.
    pub fn new(config: ReframeConfig) -> AiResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: None,
        })
    }

    /// Stop at the next scene boundary once `cancel` fires.
    pub fn with_cancel(mut self, cancel: ReframeCancel) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn config(&self) -> &ReframeConfig {
        &self.config
    }

    /// Compute all four tracks for `scenes` of `source`.
    ///
    /// `source` is read forward once; scenes must be ordered and the source
    /// positioned at or before the first scene. Scenes shorter than one
    /// window are skipped and leave a gap in every track.
    pub fn run<M: SaliencyModel + ?Sized>(
        &self,
        source: &mut dyn FrameSource,
        scenes: &[Scene],
        model: &mut M,
        mut progress_callback: impl FnMut(ReframeProgress),
    ) -> AiResult<ReframeTracks> {
        if let Some(expected) = model.temporal_len() {
            if expected != self.config.temporal_len {
                return Err(AiError::invalid(format!(
                    "model expects {expected}-frame windows, config has temporal_len {}",
                    self.config.temporal_len
                )));
            }
        }

        let rate = source.frame_rate();
        let total = scenes.len();
        let mut tracks = ReframeTracks::default();

        info!(scenes = total, "Starting reframing");

        for (i, scene) in scenes.iter().enumerate() {
            if self.cancel.as_ref().is_some_and(ReframeCancel::is_cancelled) {
                warn!(completed = i, total, "Reframing cancelled");
                return Err(AiError::Cancelled {
                    completed: i,
                    total,
                });
            }

            let (scene_tracks, windows) = self.process_scene(&mut *source, scene, rate, model)?;
            info!(
                scene = i,
                start_frame = scene.start_frame,
                end_frame = scene.end_frame,
                windows,
                tracking_boxes = scene_tracks.portrait_tracking.len(),
                "Scene reframed"
            );

            tracks.square_scene.extend(scene_tracks.square_scene);
            tracks.portrait_scene.extend(scene_tracks.portrait_scene);
            tracks.square_tracking.extend(scene_tracks.square_tracking);
            tracks.portrait_tracking.extend(scene_tracks.portrait_tracking);

            progress_callback(ReframeProgress {
                scene_index: i,
                scene_count: total,
                windows,
            });
        }

        let min_len = self.config.min_scene_len;
        tracks.square_scene = post_process_scene_bboxes(&tracks.square_scene, min_len);
        tracks.portrait_scene = post_process_scene_bboxes(&tracks.portrait_scene, min_len);

        info!(
            scene_boxes = tracks.portrait_scene.len(),
            tracking_boxes = tracks.portrait_tracking.len(),
            "Reframing complete"
        );
        Ok(tracks)
    }

    fn process_scene<M: SaliencyModel + ?Sized>(
        &self,
        source: &mut dyn FrameSource,
        scene: &Scene,
        rate: FrameRate,
        model: &mut M,
    ) -> AiResult<(SceneTracks, usize)> {
        let cfg = &self.config;
        let frame_count = scene.frame_count();
        if frame_count < cfg.temporal_len as u64 {
            warn!(
                start_frame = scene.start_frame,
                frames = frame_count,
                temporal_len = cfg.temporal_len,
                "Scene shorter than one window, skipping"
            );
            return Ok((SceneTracks::default(), 0));
        }

        let raw = self.extract_centroids(source, scene, model)?;
        if raw.is_empty() {
            warn!(start_frame = scene.start_frame, "Source ended before the scene's first window, skipping");
            return Ok((SceneTracks::default(), 0));
        }
        let n = frame_count as usize;
        let working = cfg.working_size();

        // Scene track
        let filtered = smoothing::median_filter_centroids(&raw, cfg.kernel_size)?;
        let mut segments = cluster::compute_smoothed_centroids(
            &filtered,
            cfg.step_size,
            cfg.cluster_threshold,
            cfg.smoothing_threshold,
        )?;
        cluster::trim_to_frame_count(&mut segments, n);
        hold_to_frame_count(&mut segments, n);

        let mut tracks = SceneTracks::default();
        let mut offset = scene.start_frame;
        for (i, segment) in segments.iter().enumerate() {
            let Some(at) = segment.first() else {
                continue;
            };
            let start = rate.frames_to_seconds(offset);
            offset += segment.len() as u64;
            let end = rate.frames_to_seconds(offset);
            let first = i == 0;
            tracks
                .square_scene
                .push(BBox::new(start, end, bbox::project(at.x, working, TargetAspect::Square)?, first));
            tracks
                .portrait_scene
                .push(BBox::new(start, end, bbox::project(at.x, working, TargetAspect::Portrait)?, first));
        }

        // Tracking track
        let signal = smoothing::tracking_signal(&raw, cfg.step_size, cfg.kernel_size, n)?;
        let xs: Vec<f64> = signal.iter().map(|p| p.x).collect();
        let params = TurningPointParams {
            min_change: cfg.min_change,
            max_drift: cfg.max_drift,
        };
        let turning = compute_turning_points(&xs, params);
        let times = linspace(scene.start_time, scene.end_time, n);
        debug!(
            start_frame = scene.start_frame,
            clusters = segments.len(),
            turning_points = turning.len(),
            "Scene signals ready"
        );

        let spans: Vec<(usize, usize)> = match turning.as_slice() {
            [only] => vec![(*only, n - 1)],
            points => points.windows(2).map(|w| (w[0], w[1])).collect(),
        };
        for (a, b) in spans {
            let (start, end) = (times[a], times[b]);
            let hcenter = xs[a];
            tracks
                .square_tracking
                .push(BBox::new(start, end, bbox::project(hcenter, working, TargetAspect::Square)?, false));
            tracks
                .portrait_tracking
                .push(BBox::new(start, end, bbox::project(hcenter, working, TargetAspect::Portrait)?, false));
        }

        Ok((tracks, raw.len()))
    }

    /// One raw centroid per window of `scene`.
    fn extract_centroids<M: SaliencyModel + ?Sized>(
        &self,
        source: &mut dyn FrameSource,
        scene: &Scene,
        model: &mut M,
    ) -> AiResult<Vec<Point2>> {
        let cfg = &self.config;
        let extractor = CentroidExtractor {
            min_intensity: cfg.min_intensity,
            floor: cfg.min_intensity_floor,
            step: cfg.intensity_step,
        };

        let mut sampler = WindowSampler::new(
            source,
            scene.start_frame,
            scene.end_frame,
            cfg.temporal_len,
            cfg.step_size,
        )?;
        let mut raw = Vec::with_capacity(window::expected_windows(
            scene.frame_count(),
            cfg.temporal_len,
            cfg.step_size,
        ));

        for window in sampler.by_ref() {
            let window = window?;
            let heatmap = model.infer(&window)?;
            if (heatmap.width(), heatmap.height()) != (cfg.decode_width, cfg.decode_height) {
                return Err(AiError::InferenceError(format!(
                    "saliency map for window {} is {}x{}, expected {}x{}",
                    window.index,
                    heatmap.width(),
                    heatmap.height(),
                    cfg.decode_width,
                    cfg.decode_height
                )));
            }
            let map = saliency::postprocess(&heatmap, cfg.blur_sigma);
            let centroid = extractor.extract(&map, window.index)?;
            debug!(window = window.index, last_frame = window.last_frame, x = centroid.x, y = centroid.y, "Centroid");
            raw.push(centroid);
        }

        if sampler.truncated() {
            warn!(
                start_frame = scene.start_frame,
                end_frame = scene.end_frame,
                windows = raw.len(),
                "Scene decoded short, holding the last centroid to its end"
            );
        }
        Ok(raw)
    }
}

/// Extend the final segment with its last point until the segments cover
/// `frame_count` samples.
fn hold_to_frame_count(segments: &mut [SmoothedSegment], frame_count: usize) {
    let missing = frame_count.saturating_sub(cluster::total_len(segments));
    if missing == 0 {
        return;
    }
    if let Some(last) = segments.last_mut() {
        if let Some(&p) = last.points.last() {
            last.points.extend(std::iter::repeat(p).take(missing));
        }
    }
}

/// `n` evenly spaced values from `start` to `end` inclusive.
fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut v: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            v[n - 1] = end;
            v
        }
    }
}

/// Compute scene and tracking boxes for the video at `video_path`.
///
/// The video is decoded twice at the configured decode size: once for scene
/// detection and once, with frame prefetching, for saliency.
pub fn compute_portrait_square_bboxes_with_scenes<M: SaliencyModel + ?Sized>(
    video_path: &Path,
    model: &mut M,
    config: &ReframeConfig,
) -> AiResult<ReframeTracks> {
    compute_with_progress(video_path, model, config, None, |_| {})
}

/// [`compute_portrait_square_bboxes_with_scenes`] with progress reporting
/// and an optional cancellation handle.
pub fn compute_with_progress<M: SaliencyModel + ?Sized>(
    video_path: &Path,
    model: &mut M,
    config: &ReframeConfig,
    cancel: Option<ReframeCancel>,
    progress_callback: impl FnMut(ReframeProgress),
) -> AiResult<ReframeTracks> {
    let mut reframer = Reframer::new(config.clone())?;
    if let Some(cancel) = cancel {
        reframer = reframer.with_cancel(cancel);
    }

    let probe = MediaProbe::probe(video_path)?;
    let stream = probe.require_video()?;
    let (width, height) = (config.decode_width, config.decode_height);
    info!(
        path = %video_path.display(),
        source_width = stream.width,
        source_height = stream.height,
        frames = ?stream.frame_count,
        "Reframing video"
    );

    let scenes = {
        let mut decoder = VideoDecoder::open_probed(&probe, width, height)?;
        let mut detector = AdaptiveDetector::new(config.scene_detect.clone());
        scene_detect::detect_scenes(&mut decoder, &mut detector, stream.frame_count, config)?
    };

    let decoder = VideoDecoder::open_probed(&probe, width, height)?;
    let mut source = PrefetchSource::spawn(decoder, config.temporal_len)?;
    reframer.run(&mut source, &scenes, model, progress_callback)
}
