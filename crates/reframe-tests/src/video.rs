//! Full pipeline over a real encoded file. Skipped when FFmpeg is not
//! installed.

use crate::support::{assert_boxes_valid, disc_map, init_tracing};
use ffmpeg_sidecar::command::FfmpegCommand;
use reframe_ai::{
    compute_portrait_square_bboxes_with_scenes, compute_with_progress, AiError, ReframeCancel,
    ReframeConfig, Window,
};
use std::path::{Path, PathBuf};

/// Encode a `seconds`-long 640x360 test pattern at 30 fps.
fn render_test_video(dir: &Path, seconds: u32) -> anyhow::Result<PathBuf> {
    let path = dir.join("pattern.mp4");
    let status = FfmpegCommand::new()
        .hide_banner()
        .args(["-f", "lavfi", "-i"])
        .arg(format!("testsrc2=size=640x360:rate=30:duration={seconds}"))
        .args(["-pix_fmt", "yuv420p"])
        .overwrite()
        .output(path.to_string_lossy().as_ref())
        .spawn()?
        .wait()?;
    anyhow::ensure!(status.success(), "ffmpeg failed to render the test video");
    Ok(path)
}

#[test]
fn reframes_encoded_video() -> anyhow::Result<()> {
    init_tracing();
    if !reframe_media::tools_available() {
        eprintln!("ffmpeg/ffprobe not found, skipping");
        return Ok(());
    }
    let dir = tempfile::tempdir()?;
    let video = render_test_video(dir.path(), 3)?;

    let mut calls = 0usize;
    let mut model = |w: &Window| {
        calls += 1;
        assert_eq!(w.len(), 32);
        assert_eq!(w.dimensions(), (384, 224));
        disc_map(150.0 + w.last_frame as f64, 112.0, 12.0)
    };
    let tracks = compute_portrait_square_bboxes_with_scenes(&video, &mut model, &ReframeConfig::default())?;

    assert!(calls > 0);
    for track in [
        &tracks.square_scene,
        &tracks.portrait_scene,
        &tracks.square_tracking,
        &tracks.portrait_tracking,
    ] {
        assert!(!track.is_empty());
        assert_boxes_valid(track);
        assert!(track.windows(2).all(|w| w[0].end_time <= w[1].start_time));
        assert!(track[track.len() - 1].end_time <= 3.0 + 1e-9);
    }
    Ok(())
}

#[test]
fn cancelled_run_reports_progress_so_far() -> anyhow::Result<()> {
    if !reframe_media::tools_available() {
        return Ok(());
    }
    let dir = tempfile::tempdir()?;
    let video = render_test_video(dir.path(), 2)?;

    let cancel = ReframeCancel::new();
    cancel.cancel();
    let mut model = |_: &Window| disc_map(200.0, 112.0, 12.0);
    let result = compute_with_progress(&video, &mut model, &ReframeConfig::default(), Some(cancel), |_| {});
    assert!(matches!(result, Err(AiError::Cancelled { completed: 0, .. })));
    Ok(())
}

#[test]
fn missing_file_is_an_error() {
    if !reframe_media::tools_available() {
        return;
    }
    let mut model = |_: &Window| disc_map(200.0, 112.0, 12.0);
    let result = compute_portrait_square_bboxes_with_scenes(
        Path::new("/nonexistent/clip.mp4"),
        &mut model,
        &ReframeConfig::default(),
    );
    assert!(result.is_err());
}
