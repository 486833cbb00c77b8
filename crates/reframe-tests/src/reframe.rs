//! End-to-end reframing over synthetic video.

use crate::support::{assert_boxes_valid, assert_contiguous, disc_map, flat_source, init_tracing};
use reframe_ai::cluster::{compute_smoothed_centroids, SegmentKind};
use reframe_ai::{BBox, ReframeConfig, ReframeProgress, Reframer, Scene, Window};
use reframe_core::{FrameRate, Point2};

// ── Moving subject ─────────────────────────────────────────────

/// Disc centre for frame `f` of a 300-frame pan from x=50 to x=300.
fn pan_x(frame: u64) -> f64 {
    (50.0 + 250.0 * frame as f64 / 299.0).round()
}

#[test]
fn moving_dot_pans_portrait_crop_rightward() -> anyhow::Result<()> {
    init_tracing();
    let rate = FrameRate::FPS_30;
    let scenes = [Scene::new(0, 300, rate)];
    let mut src = flat_source(300, rate);
    let mut model = |w: &Window| disc_map(pan_x(w.last_frame), 112.0, 12.0);

    let tracks = Reframer::new(ReframeConfig::default())?.run(&mut src, &scenes, &mut model, |_| {})?;

    let portrait = &tracks.portrait_tracking;
    assert!(portrait.len() > 2, "a pan needs several waypoints");
    assert_contiguous(portrait, 0.0, 10.0);
    assert_boxes_valid(portrait);

    let xmins: Vec<f64> = portrait.iter().map(|b| b.bbox.xmin).collect();
    assert!(xmins.windows(2).all(|w| w[0] <= w[1]), "{xmins:?}");
    assert!(xmins[0] < xmins[xmins.len() - 1]);

    // The square track follows the same waypoints.
    assert_eq!(tracks.square_tracking.len(), portrait.len());
    for (sq, pt) in tracks.square_tracking.iter().zip(portrait) {
        assert_eq!((sq.start_time, sq.end_time), (pt.start_time, pt.end_time));
        assert!(sq.bbox.width() > pt.bbox.width());
    }
    Ok(())
}

#[test]
fn moving_dot_scene_track_covers_scene() -> anyhow::Result<()> {
    let rate = FrameRate::FPS_30;
    let scenes = [Scene::new(0, 300, rate)];
    let mut src = flat_source(300, rate);
    let mut model = |w: &Window| disc_map(pan_x(w.last_frame), 112.0, 12.0);

    let tracks = Reframer::new(ReframeConfig::default())?.run(&mut src, &scenes, &mut model, |_| {})?;
    assert_contiguous(&tracks.portrait_scene, 0.0, 10.0);
    assert_contiguous(&tracks.square_scene, 0.0, 10.0);
    assert!(tracks.portrait_scene[0].is_scene_boundary);
    assert_boxes_valid(&tracks.square_scene);
    Ok(())
}

// ── Multi-scene coverage ───────────────────────────────────────

fn subject_x(frame: u64) -> f64 {
    match frame {
        0..=59 => 100.0,
        60..=74 => 110.0,
        _ => 300.0,
    }
}

#[test]
fn short_scene_merges_into_nearer_neighbour() -> anyhow::Result<()> {
    init_tracing();
    let rate = FrameRate::FPS_30;
    let scenes = [
        Scene::new(0, 60, rate),
        Scene::new(60, 75, rate),
        Scene::new(75, 150, rate),
    ];
    let config = ReframeConfig {
        temporal_len: 8,
        step_size: 8,
        ..Default::default()
    };
    let mut src = flat_source(150, rate);
    let mut model = |w: &Window| disc_map(subject_x(w.last_frame), 112.0, 12.0);

    let mut progress: Vec<ReframeProgress> = Vec::new();
    let tracks = Reframer::new(config)?.run(&mut src, &scenes, &mut model, |p| progress.push(p))?;

    assert_eq!(progress.len(), 3);
    assert!(progress.iter().all(|p| p.windows > 0));
    assert_eq!(progress[2].fraction(), 1.0);

    // The 0.5 s scene sits next to the x=100 scene, not the x=300 one.
    for track in [&tracks.portrait_scene, &tracks.square_scene] {
        assert_eq!(track.len(), 2, "{track:?}");
        assert_eq!(track[0].end_time, 2.5);
        assert_contiguous(track, 0.0, 5.0);
        assert!(track.iter().all(|b| b.is_scene_boundary));
    }

    // Tracking boxes are never merged and still tile every scene.
    assert_contiguous(&tracks.portrait_tracking, 0.0, 5.0);
    assert!(tracks
        .portrait_tracking
        .iter()
        .any(|b| b.start_time == 2.0 || b.end_time == 2.0));
    Ok(())
}

#[test]
fn scene_shorter_than_window_leaves_gap() -> anyhow::Result<()> {
    let rate = FrameRate::FPS_30;
    let scenes = [Scene::new(0, 20, rate), Scene::new(20, 90, rate)];
    let mut src = flat_source(90, rate);
    let mut model = |_: &Window| disc_map(200.0, 112.0, 12.0);

    let tracks = Reframer::new(ReframeConfig::default())?.run(&mut src, &scenes, &mut model, |_| {})?;
    let start = rate.frames_to_seconds(20);
    assert_contiguous(&tracks.portrait_tracking, start, 3.0);
    assert_eq!(tracks.portrait_scene[0].start_time, start);
    Ok(())
}

#[test]
fn tracks_serialize_as_corner_arrays() -> anyhow::Result<()> {
    let rate = FrameRate::FPS_30;
    let scenes = [Scene::new(0, 64, rate)];
    let mut src = flat_source(64, rate);
    let mut model = |_: &Window| disc_map(200.0, 112.0, 12.0);

    let tracks = Reframer::new(ReframeConfig::default())?.run(&mut src, &scenes, &mut model, |_| {})?;
    let json: serde_json::Value = serde_json::from_str(&tracks.to_json()?)?;

    for key in ["square_scene", "portrait_scene", "square_tracking", "portrait_tracking"] {
        let track = json[key].as_array().ok_or_else(|| anyhow::anyhow!("missing {key}"))?;
        assert!(!track.is_empty());
        let corners = track[0]["bbox"].as_array().ok_or_else(|| anyhow::anyhow!("bbox not an array"))?;
        assert_eq!(corners.len(), 4);
        assert!(track[0]["is_scene_boundary"].is_boolean());
    }

    let (square_scene, _, _, _): (Vec<BBox>, Vec<BBox>, Vec<BBox>, Vec<BBox>) = tracks.into();
    assert_eq!(square_scene.len(), 1);
    Ok(())
}

// ── Cluster smoothing ──────────────────────────────────────────

fn xs(points: &[Point2]) -> Vec<f64> {
    points.iter().map(|p| p.x).collect()
}

#[test]
fn close_clusters_ramp_strictly() -> anyhow::Result<()> {
    let raw: Vec<Point2> = [0.0, 0.0, 0.0, 8.0, 8.0, 8.0]
        .iter()
        .map(|&x| Point2::new(x, 50.0))
        .collect();
    let segments = compute_smoothed_centroids(&raw, 4, 5.0, 10.0)?;

    assert_eq!(segments.len(), 2);
    assert_eq!(segments[0].kind, SegmentKind::Interpolated);
    let ramp = xs(&segments[0].points);
    assert_eq!(ramp.len(), 12);
    assert_eq!(ramp[0], 0.0);
    assert_eq!(ramp[11], 8.0);
    assert!(ramp.windows(2).all(|w| w[0] < w[1]), "{ramp:?}");
    assert_eq!(segments[1].kind, SegmentKind::Held);
    Ok(())
}

#[test]
fn distant_clusters_hold_first_median() -> anyhow::Result<()> {
    let raw: Vec<Point2> = [0.0, 0.0, 0.0, 30.0, 30.0, 30.0]
        .iter()
        .map(|&x| Point2::new(x, 50.0))
        .collect();
    let segments = compute_smoothed_centroids(&raw, 4, 5.0, 10.0)?;

    assert_eq!(segments[0].kind, SegmentKind::Held);
    assert_eq!(xs(&segments[0].points), vec![0.0; 12]);
    assert_eq!(xs(&segments[1].points), vec![30.0; 12]);
    Ok(())
}
