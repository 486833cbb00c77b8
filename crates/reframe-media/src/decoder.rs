//! Video decoder using FFmpeg via ffmpeg-sidecar.

use crate::probe::MediaProbe;
use crate::source::FrameSource;
use ffmpeg_sidecar::child::FfmpegChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::{FfmpegEvent, LogLevel};
use ffmpeg_sidecar::iter::FfmpegIterator;
use reframe_core::{FrameBuffer, FrameRate, PixelFormat, ReframeError, Result};
use std::path::Path;
use tracing::{debug, info, warn};

/// A decoded video frame with metadata.
pub struct VideoFrame {
    /// Frame data in RGB8 format at the decoder's output size
    pub buffer: FrameBuffer,
    /// Presentation timestamp in seconds
    pub pts: f64,
    /// Frame number
    pub frame_number: u64,
}

/// Video decoder using FFmpeg.
///
/// Spawns FFmpeg as a subprocess that scales every frame to a fixed output
/// size and pipes raw RGB24 on stdout. Frames can only be read forward.
pub struct VideoDecoder {
    path: String,
    width: u32,
    height: u32,
    source_dimensions: (u32, u32),
    frame_rate: FrameRate,
    frame_count: Option<u64>,
    current_frame: u64,
    child: FfmpegChild,
    events: FfmpegIterator,
    finished: bool,
}

impl VideoDecoder {
    /// Open a video file for decoding at `width` x `height`.
    pub fn open<P: AsRef<Path>>(path: P, width: u32, height: u32) -> Result<Self> {
        let probe = MediaProbe::probe(&path)?;
        Self::open_probed(&probe, width, height)
    }

    /// Open a file that has already been probed.
    pub fn open_probed(probe: &MediaProbe, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ReframeError::InvalidParameter(format!(
                "Decode size must be non-zero, got {width}x{height}"
            )));
        }
        let video = probe.require_video()?;

        info!(
            path = %probe.path,
            source_width = video.width,
            source_height = video.height,
            fps = ?video.frame_rate,
            frames = ?video.frame_count,
            "Opening video for decoding"
        );

        let mut child = FfmpegCommand::new()
            .hide_banner()
            .input(&probe.path)
            .args(["-vf", &format!("scale={width}:{height}")])
            .rawvideo()
            .spawn()
            .map_err(|e| ReframeError::Decoder(format!("Failed to spawn ffmpeg: {e}")))?;

        let events = child
            .iter()
            .map_err(|e| ReframeError::Decoder(format!("Failed to read ffmpeg output: {e}")))?;

        Ok(Self {
            path: probe.path.clone(),
            width,
            height,
            source_dimensions: (video.width, video.height),
            frame_rate: video.frame_rate,
            frame_count: video.frame_count,
            current_frame: 0,
            child,
            events,
            finished: false,
        })
    }

    /// Get the file path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Dimensions of the source stream before scaling.
    pub fn source_dimensions(&self) -> (u32, u32) {
        self.source_dimensions
    }

    /// Decode the next frame.
    pub fn decode_frame(&mut self) -> Result<Option<VideoFrame>> {
        if self.finished {
            return Ok(None);
        }

        while let Some(event) = self.events.next() {
            match event {
                FfmpegEvent::OutputFrame(frame) => {
                    if frame.pix_fmt != "rgb24" {
                        return Err(ReframeError::UnsupportedFormat(format!(
                            "Expected rgb24 frames from ffmpeg, got {}",
                            frame.pix_fmt
                        )));
                    }
                    let buffer = FrameBuffer::from_packed(
                        frame.width,
                        frame.height,
                        PixelFormat::Rgb8,
                        frame.data,
                    )?;
                    let frame_number = self.current_frame;
                    self.current_frame += 1;
                    return Ok(Some(VideoFrame {
                        buffer,
                        pts: self.frame_rate.frames_to_seconds(frame_number),
                        frame_number,
                    }));
                }
                FfmpegEvent::Log(LogLevel::Fatal, msg) => {
                    self.finish();
                    return Err(ReframeError::Decoder(format!(
                        "ffmpeg failed on {} at frame {}: {}",
                        self.path, self.current_frame, msg
                    )));
                }
                FfmpegEvent::Log(LogLevel::Error, msg) | FfmpegEvent::Error(msg) => {
                    warn!(path = %self.path, frame = self.current_frame, "ffmpeg: {}", msg);
                }
                FfmpegEvent::Done => break,
                _ => {}
            }
        }

        self.finish_stream()?;
        Ok(None)
    }

    fn finish_stream(&mut self) -> Result<()> {
        self.finished = true;
        let status = self.child.wait()?;
        debug!(path = %self.path, frames = self.current_frame, %status, "ffmpeg stream ended");
        if !status.success() && self.current_frame == 0 {
            return Err(ReframeError::Decoder(format!(
                "ffmpeg exited with {} before producing any frame of {}",
                status, self.path
            )));
        }
        if let Some(expected) = self.frame_count {
            if expected != self.current_frame {
                debug!(
                    expected,
                    decoded = self.current_frame,
                    "Decoded frame count differs from probe"
                );
            }
        }
        Ok(())
    }

    fn finish(&mut self) {
        if !self.finished {
            self.finished = true;
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

impl FrameSource for VideoDecoder {
    fn frame_rate(&self) -> FrameRate {
        self.frame_rate
    }

    fn frame_count(&self) -> Option<u64> {
        self.frame_count
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn position(&self) -> u64 {
        self.current_frame
    }

    fn next_frame(&mut self) -> Result<Option<FrameBuffer>> {
        Ok(self.decode_frame()?.map(|f| f.buffer))
    }
}

impl Drop for VideoDecoder {
    fn drop(&mut self) {
        self.finish();
    }
}
