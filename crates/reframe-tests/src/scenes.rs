//! Scene segmentation over synthetic sources.

use crate::support::{cut_source, flat_source, init_tracing};
use reframe_ai::{detect_scenes, AdaptiveDetector, AiResult, ReframeConfig, Scene, SceneDetector};
use reframe_core::FrameRate;
use reframe_media::FrameSource;

/// Reports fixed ranges after reading the whole source.
struct FixedDetector(Vec<(u64, u64)>);

impl SceneDetector for FixedDetector {
    fn detect(&mut self, source: &mut dyn FrameSource, _min_scene_len: u64) -> AiResult<Vec<(u64, u64)>> {
        while source.next_frame()?.is_some() {}
        Ok(self.0.clone())
    }
}

#[test]
fn no_cuts_yields_one_scene_over_known_count() -> anyhow::Result<()> {
    init_tracing();
    let rate = FrameRate::FPS_30;
    let mut src = flat_source(90, rate);
    let mut detector = AdaptiveDetector::default();

    let scenes = detect_scenes(&mut src, &mut detector, Some(90), &ReframeConfig::default())?;
    assert_eq!(scenes, vec![Scene::new(0, 90, rate)]);
    assert_eq!(scenes[0].end_time, 3.0);
    Ok(())
}

#[test]
fn no_cuts_with_unknown_count_uses_scanned_frames() -> anyhow::Result<()> {
    let rate = FrameRate::FPS_25;
    let mut src = flat_source(50, rate).with_unknown_frame_count();
    let mut detector = AdaptiveDetector::default();

    let scenes = detect_scenes(&mut src, &mut detector, None, &ReframeConfig::default())?;
    assert_eq!(scenes, vec![Scene::new(0, 50, rate)]);
    Ok(())
}

#[test]
fn hard_cuts_split_scenes() -> anyhow::Result<()> {
    init_tracing();
    let rate = FrameRate::FPS_30;
    let mut src = cut_source(150, rate, &[60, 105]);
    let mut detector = AdaptiveDetector::default();

    let scenes = detect_scenes(&mut src, &mut detector, Some(150), &ReframeConfig::default())?;
    let bounds: Vec<(u64, u64)> = scenes.iter().map(|s| (s.start_frame, s.end_frame)).collect();
    assert_eq!(bounds, vec![(0, 60), (60, 105), (105, 150)]);
    assert_eq!(scenes[1].start_time, 2.0);
    assert_eq!(scenes[1].end_time, 3.5);
    Ok(())
}

#[test]
fn last_scene_extends_to_probed_count() -> anyhow::Result<()> {
    let rate = FrameRate::FPS_30;
    let detected = vec![(0, 40), (40, 80)];

    let mut src = flat_source(80, rate);
    let mut detector = FixedDetector(detected.clone());
    let scenes = detect_scenes(&mut src, &mut detector, Some(100), &ReframeConfig::default())?;
    assert_eq!(scenes.last().map(|s| s.end_frame), Some(100));

    let config = ReframeConfig {
        include_last_scene: false,
        ..Default::default()
    };
    let mut src = flat_source(80, rate);
    let mut detector = FixedDetector(detected);
    let scenes = detect_scenes(&mut src, &mut detector, Some(100), &config)?;
    assert_eq!(scenes.last().map(|s| s.end_frame), Some(80));
    Ok(())
}

#[test]
fn gap_in_detected_scenes_is_rejected() {
    let mut src = flat_source(80, FrameRate::FPS_30);
    let mut detector = FixedDetector(vec![(0, 30), (35, 80)]);
    assert!(detect_scenes(&mut src, &mut detector, Some(80), &ReframeConfig::default()).is_err());
}
