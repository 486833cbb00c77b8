//! Temporal windows over one scene.
//!
//! The saliency model looks at `temporal_len` frames at a time. So that the
//! first window of a scene is full, the scene's leading `temporal_len - 1`
//! frames are fed in reverse before forward reading begins:
//!
//! ```text
//! f30 f29 .. f1 f0 | f0 f1 f2 ...
//! ```
//!
//! Only those leading frames are buffered; the rest of the scene streams
//! from the source once.

use reframe_core::{FrameBuffer, Result};
use reframe_media::FrameSource;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{trace, warn};

/// `temporal_len` consecutive frames fed to the saliency model.
#[derive(Debug, Clone)]
pub struct Window {
    /// Position of the window within its scene.
    pub index: usize,
    /// Absolute index of the newest frame in the window.
    pub last_frame: u64,
    /// Frames oldest first.
    pub frames: Vec<Arc<FrameBuffer>>,
}

impl Window {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Size `(width, height)` of the window's frames.
    pub fn dimensions(&self) -> (u32, u32) {
        self.frames
            .first()
            .map(|f| (f.width, f.height))
            .unwrap_or((0, 0))
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    /// Emitting the buffered head newest to oldest; holds the next offset + 1.
    Reversed(usize),
    /// Emitting the buffered head oldest to newest; holds the next offset.
    Replay(usize),
    Forward,
    Done,
}

/// Frames of one scene with reversed priming, read through a single cursor.
pub struct PrimedFrames<'a, S: FrameSource + ?Sized> {
    source: &'a mut S,
    head: Vec<Arc<FrameBuffer>>,
    phase: Phase,
    start_frame: u64,
    next_frame: u64,
    end_frame: u64,
    truncated: bool,
}

impl<'a, S: FrameSource + ?Sized> PrimedFrames<'a, S> {
    /// Position `source` at `start_frame` and buffer up to `prime_len`
    /// leading frames of the scene `[start_frame, end_frame)`.
    pub fn new(source: &'a mut S, start_frame: u64, end_frame: u64, prime_len: usize) -> Result<Self> {
        source.seek_forward(start_frame)?;

        let wanted = end_frame.saturating_sub(start_frame).min(prime_len as u64);
        let mut head = Vec::with_capacity(wanted as usize);
        let mut truncated = false;
        while (head.len() as u64) < wanted {
            match source.next_frame()? {
                Some(frame) => head.push(Arc::new(frame)),
                None => {
                    truncated = true;
                    break;
                }
            }
        }

        Ok(Self {
            phase: Phase::Reversed(head.len()),
            next_frame: start_frame + head.len() as u64,
            head,
            source,
            start_frame,
            end_frame,
            truncated,
        })
    }

    /// Whether the source ran out before the scene's last frame.
    pub fn truncated(&self) -> bool {
        self.truncated
    }
}

impl<S: FrameSource + ?Sized> Iterator for PrimedFrames<'_, S> {
    /// Absolute frame index and the frame.
    type Item = Result<(u64, Arc<FrameBuffer>)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.phase {
                Phase::Reversed(0) => self.phase = Phase::Replay(0),
                Phase::Reversed(n) => {
                    self.phase = Phase::Reversed(n - 1);
                    let offset = n - 1;
                    return Some(Ok((
                        self.start_frame + offset as u64,
                        Arc::clone(&self.head[offset]),
                    )));
                }
                Phase::Replay(offset) if offset < self.head.len() => {
                    self.phase = Phase::Replay(offset + 1);
                    return Some(Ok((
                        self.start_frame + offset as u64,
                        Arc::clone(&self.head[offset]),
                    )));
                }
                Phase::Replay(_) => {
                    self.head = Vec::new();
                    self.phase = Phase::Forward;
                }
                Phase::Forward => {
                    if self.truncated || self.next_frame >= self.end_frame {
                        self.phase = Phase::Done;
                        continue;
                    }
                    return match self.source.next_frame() {
                        Ok(Some(frame)) => {
                            let index = self.next_frame;
                            self.next_frame += 1;
                            Some(Ok((index, Arc::new(frame))))
                        }
                        Ok(None) => {
                            warn!(
                                frame = self.next_frame,
                                scene_end = self.end_frame,
                                "Source ended before the scene did"
                            );
                            self.truncated = true;
                            self.phase = Phase::Done;
                            None
                        }
                        Err(e) => {
                            self.phase = Phase::Done;
                            Some(Err(e))
                        }
                    };
                }
                Phase::Done => return None,
            }
        }
    }
}

/// Fixed-length, strided windows over primed scene frames. A trailing
/// partial window is dropped.
pub struct WindowSampler<'a, S: FrameSource + ?Sized> {
    frames: PrimedFrames<'a, S>,
    temporal_len: usize,
    stride: usize,
    buffer: VecDeque<(u64, Arc<FrameBuffer>)>,
    emitted: usize,
}

impl<'a, S: FrameSource + ?Sized> WindowSampler<'a, S> {
    /// Windows over the scene `[start_frame, end_frame)` of `source`.
    ///
    /// `stride` must be in `1..=temporal_len`.
    pub fn new(
        source: &'a mut S,
        start_frame: u64,
        end_frame: u64,
        temporal_len: usize,
        stride: usize,
    ) -> Result<Self> {
        if temporal_len == 0 || stride == 0 || stride > temporal_len {
            return Err(reframe_core::ReframeError::InvalidParameter(format!(
                "window stride {stride} must be in 1..={temporal_len}"
            )));
        }
        let frames = PrimedFrames::new(source, start_frame, end_frame, temporal_len - 1)?;
        Ok(Self {
            frames,
            temporal_len,
            stride,
            buffer: VecDeque::with_capacity(temporal_len),
            emitted: 0,
        })
    }

    /// Whether the source ran out before the scene's last frame.
    pub fn truncated(&self) -> bool {
        self.frames.truncated()
    }
}

impl<S: FrameSource + ?Sized> Iterator for WindowSampler<'_, S> {
    type Item = Result<Window>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.buffer.len() < self.temporal_len {
            match self.frames.next()? {
                Ok(entry) => self.buffer.push_back(entry),
                Err(e) => return Some(Err(e)),
            }
        }

        let last_frame = self.buffer.back().map(|(i, _)| *i).unwrap_or_default();
        let window = Window {
            index: self.emitted,
            last_frame,
            frames: self.buffer.iter().map(|(_, f)| Arc::clone(f)).collect(),
        };
        self.buffer.drain(..self.stride);
        self.emitted += 1;
        trace!(window = window.index, last_frame, "Window ready");
        Some(Ok(window))
    }
}

/// Number of windows a scene of `frame_count` frames yields when the source
/// delivers all of them.
pub fn expected_windows(frame_count: u64, temporal_len: usize, stride: usize) -> usize {
    if temporal_len == 0 || stride == 0 {
        return 0;
    }
    let primed = frame_count.min(temporal_len.saturating_sub(1) as u64) + frame_count;
    if primed < temporal_len as u64 {
        0
    } else {
        ((primed - temporal_len as u64) / stride as u64) as usize + 1
    }
}
