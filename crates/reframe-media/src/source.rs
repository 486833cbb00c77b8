//! Forward-only frame sources.
//!
//! The pipeline reads every frame of a video exactly once, in order. A
//! `FrameSource` models that cursor; `VideoDecoder` is the ffmpeg-backed
//! implementation and the in-memory sources below serve synthetic videos.

use reframe_core::{FrameBuffer, FrameRate, ReframeError, Result};
use std::collections::VecDeque;

/// A sequential frame cursor with known geometry and timing.
pub trait FrameSource {
    /// Average frame rate of the stream.
    fn frame_rate(&self) -> FrameRate;

    /// Total number of frames, when it can be determined up front.
    fn frame_count(&self) -> Option<u64>;

    /// Dimensions `(width, height)` of the frames this source yields.
    fn dimensions(&self) -> (u32, u32);

    /// Index of the frame the next call to `next_frame` returns.
    fn position(&self) -> u64;

    /// Decode the next frame, or `None` at end of stream.
    fn next_frame(&mut self) -> Result<Option<FrameBuffer>>;

    /// Discard up to `n` frames. Returns how many were actually skipped.
    fn skip_frames(&mut self, n: u64) -> Result<u64> {
        let mut skipped = 0;
        while skipped < n {
            if self.next_frame()?.is_none() {
                break;
            }
            skipped += 1;
        }
        Ok(skipped)
    }

    /// Advance the cursor to `target`. Rewinding is an error.
    fn seek_forward(&mut self, target: u64) -> Result<()> {
        let position = self.position();
        if target < position {
            return Err(ReframeError::InvalidParameter(format!(
                "Frame cursor is forward-only: at {position}, asked for {target}"
            )));
        }
        self.skip_frames(target - position)?;
        Ok(())
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn frame_rate(&self) -> FrameRate {
        (**self).frame_rate()
    }
    fn frame_count(&self) -> Option<u64> {
        (**self).frame_count()
    }
    fn dimensions(&self) -> (u32, u32) {
        (**self).dimensions()
    }
    fn position(&self) -> u64 {
        (**self).position()
    }
    fn next_frame(&mut self) -> Result<Option<FrameBuffer>> {
        (**self).next_frame()
    }
    fn skip_frames(&mut self, n: u64) -> Result<u64> {
        (**self).skip_frames(n)
    }
}

/// Frames held in memory, yielded front to back.
pub struct MemorySource {
    frames: VecDeque<FrameBuffer>,
    frame_rate: FrameRate,
    dimensions: (u32, u32),
    frame_count: u64,
    position: u64,
}

impl MemorySource {
    /// Wrap a list of equally sized frames.
    pub fn new(frames: Vec<FrameBuffer>, frame_rate: FrameRate) -> Result<Self> {
        let dimensions = frames
            .first()
            .map(|f| (f.width, f.height))
            .unwrap_or((0, 0));
        if frames.iter().any(|f| (f.width, f.height) != dimensions) {
            return Err(ReframeError::InvalidParameter(
                "All frames of a source must share dimensions".into(),
            ));
        }
        Ok(Self {
            frame_count: frames.len() as u64,
            frames: frames.into(),
            frame_rate,
            dimensions,
            position: 0,
        })
    }
}

impl FrameSource for MemorySource {
    fn frame_rate(&self) -> FrameRate {
        self.frame_rate
    }
    fn frame_count(&self) -> Option<u64> {
        Some(self.frame_count)
    }
    fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }
    fn position(&self) -> u64 {
        self.position
    }
    fn next_frame(&mut self) -> Result<Option<FrameBuffer>> {
        let frame = self.frames.pop_front();
        if frame.is_some() {
            self.position += 1;
        }
        Ok(frame)
    }
}

/// Frames rendered on demand by a closure, so long synthetic videos never
/// sit in memory all at once.
pub struct GeneratedSource<F> {
    render: F,
    frame_rate: FrameRate,
    dimensions: (u32, u32),
    frame_count: u64,
    reported_count: Option<u64>,
    position: u64,
}

impl<F> GeneratedSource<F>
where
    F: FnMut(u64) -> FrameBuffer,
{
    /// Source of `frame_count` frames where frame `i` is `render(i)`.
    pub fn new(frame_count: u64, frame_rate: FrameRate, dimensions: (u32, u32), render: F) -> Self {
        Self {
            render,
            frame_rate,
            dimensions,
            frame_count,
            reported_count: Some(frame_count),
            position: 0,
        }
    }

    /// Hide the frame count, as with containers that do not record it.
    pub fn with_unknown_frame_count(mut self) -> Self {
        self.reported_count = None;
        self
    }
}

impl<F> FrameSource for GeneratedSource<F>
where
    F: FnMut(u64) -> FrameBuffer,
{
    fn frame_rate(&self) -> FrameRate {
        self.frame_rate
    }
    fn frame_count(&self) -> Option<u64> {
        self.reported_count
    }
    fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }
    fn position(&self) -> u64 {
        self.position
    }
    fn next_frame(&mut self) -> Result<Option<FrameBuffer>> {
        if self.position >= self.frame_count {
            return Ok(None);
        }
        let frame = (self.render)(self.position);
        self.position += 1;
        Ok(Some(frame))
    }
    fn skip_frames(&mut self, n: u64) -> Result<u64> {
        let skipped = n.min(self.frame_count - self.position);
        self.position += skipped;
        Ok(skipped)
    }
}
