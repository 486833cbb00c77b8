//! Randomized end-to-end guarantees over scene layouts and subject positions.

use crate::support::{assert_boxes_valid, assert_contiguous, disc_map, flat_source};
use proptest::prelude::*;
use reframe_ai::{ReframeConfig, Reframer, Scene, Window};
use reframe_core::FrameRate;

/// Contiguous scenes of at least one window each.
fn scene_layout() -> impl Strategy<Value = Vec<(u64, u64)>> {
    prop::collection::vec(8u64..48, 1..4).prop_map(|lengths| {
        let mut start = 0;
        lengths
            .into_iter()
            .map(|len| {
                let range = (start, start + len);
                start += len;
                range
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn tracks_tile_the_video_for_any_layout(
        layout in scene_layout(),
        subject_x in prop::collection::vec(20.0f64..364.0, 4),
    ) {
        let rate = FrameRate::FPS_30;
        let frames = layout.last().map_or(0, |&(_, end)| end);
        let scenes: Vec<Scene> = layout.iter().map(|&(s, e)| Scene::new(s, e, rate)).collect();
        let config = ReframeConfig {
            temporal_len: 8,
            step_size: 8,
            blur_sigma: 0.0,
            ..Default::default()
        };

        let mut src = flat_source(frames, rate);
        let mut model = |w: &Window| {
            let scene = layout.iter().position(|&(_, e)| w.last_frame < e).unwrap_or(0);
            disc_map(subject_x[scene % subject_x.len()], 112.0, 6.0)
        };
        let tracks = Reframer::new(config).unwrap().run(&mut src, &scenes, &mut model, |_| {}).unwrap();

        let end = rate.frames_to_seconds(frames);
        for track in [
            &tracks.square_scene,
            &tracks.portrait_scene,
            &tracks.square_tracking,
            &tracks.portrait_tracking,
        ] {
            assert_boxes_valid(track);
            assert_contiguous(track, 0.0, end);
        }

        let width = tracks.portrait_tracking[0].bbox.xmax - tracks.portrait_tracking[0].bbox.xmin;
        for b in &tracks.portrait_tracking {
            prop_assert!((b.bbox.xmax - b.bbox.xmin - width).abs() < 0.01, "{:?}", b);
        }
    }
}
