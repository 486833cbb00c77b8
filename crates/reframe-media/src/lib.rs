//! Reframe Media - FFmpeg integration for frame ingestion
//!
//! This crate handles:
//! - Media file probing
//! - Scaled RGB decoding through an ffmpeg subprocess
//! - Forward-only frame sources and background prefetch

pub mod decoder;
pub mod prefetch;
pub mod probe;
pub mod source;

pub use decoder::{VideoDecoder, VideoFrame};
pub use prefetch::PrefetchSource;
pub use probe::{MediaProbe, VideoStreamInfo};
pub use source::{FrameSource, GeneratedSource, MemorySource};

/// Whether `ffmpeg` and `ffprobe` can be found on `PATH`.
pub fn tools_available() -> bool {
    let ffmpeg = which::which("ffmpeg").is_ok();
    let ffprobe = which::which("ffprobe").is_ok();
    tracing::debug!(ffmpeg, ffprobe, "Checked for FFmpeg tools");
    ffmpeg && ffprobe
}
