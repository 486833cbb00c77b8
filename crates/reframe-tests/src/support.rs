//! Shared fixtures: synthetic sources and a deterministic saliency model.

use reframe_ai::{AiResult, BBox, Heatmap};
use reframe_core::{FrameBuffer, FrameRate};
use reframe_media::GeneratedSource;

pub const MAP_WIDTH: u32 = 384;
pub const MAP_HEIGHT: u32 = 224;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Saliency map with a bright disc of radius `r` centred on `(cx, cy)`.
pub fn disc_map(cx: f64, cy: f64, r: f64) -> AiResult<Heatmap> {
    Heatmap::from_fn(MAP_WIDTH, MAP_HEIGHT, |x, y| {
        let (dx, dy) = (x as f64 - cx, y as f64 - cy);
        if dx * dx + dy * dy <= r * r {
            1.0
        } else {
            0.0
        }
    })
}

/// Small uniform frames; the fake model never looks at pixels.
pub fn flat_source(frames: u64, rate: FrameRate) -> GeneratedSource<impl FnMut(u64) -> FrameBuffer> {
    GeneratedSource::new(frames, rate, (16, 9), |_| FrameBuffer::solid(16, 9, [40, 40, 40]))
}

/// Frames that are dark before each cut in `cuts` flips them bright, and
/// back again at the next one.
pub fn cut_source(
    frames: u64,
    rate: FrameRate,
    cuts: &'static [u64],
) -> GeneratedSource<impl FnMut(u64) -> FrameBuffer> {
    GeneratedSource::new(frames, rate, (16, 9), move |i| {
        let shot = cuts.iter().filter(|&&c| i >= c).count();
        let v = if shot % 2 == 0 { 20 } else { 220 };
        FrameBuffer::solid(16, 9, [v, v, v])
    })
}

/// Every box lies inside the unit square and is non-degenerate.
pub fn assert_boxes_valid(track: &[BBox]) {
    for b in track {
        let r = b.bbox;
        assert!(0.0 <= r.xmin && r.xmin < r.xmax && r.xmax <= 1.0, "{b:?}");
        assert!(0.0 <= r.ymin && r.ymin < r.ymax && r.ymax <= 1.0, "{b:?}");
        assert!(b.start_time < b.end_time, "{b:?}");
    }
}

/// Boxes tile `[start, end]` with no gap or overlap.
pub fn assert_contiguous(track: &[BBox], start: f64, end: f64) {
    assert!(!track.is_empty());
    assert_eq!(track[0].start_time, start);
    assert_eq!(track[track.len() - 1].end_time, end);
    for pair in track.windows(2) {
        assert_eq!(pair[0].end_time, pair[1].start_time, "{pair:?}");
    }
}
