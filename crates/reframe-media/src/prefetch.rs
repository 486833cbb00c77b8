//! Background decoding.
//!
//! `PrefetchSource` moves a frame source onto its own thread and keeps a
//! bounded queue of decoded frames ahead of the consumer, so ffmpeg can
//! decode while the saliency model runs.

use crate::source::FrameSource;
use crossbeam_channel::{bounded, Receiver};
use reframe_core::{FrameBuffer, FrameRate, ReframeError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, trace};

type FrameMessage = Result<Option<FrameBuffer>>;

/// A frame source decoded ahead of time on a worker thread.
pub struct PrefetchSource {
    frames: Receiver<FrameMessage>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    frame_rate: FrameRate,
    frame_count: Option<u64>,
    dimensions: (u32, u32),
    position: u64,
    exhausted: bool,
}

impl PrefetchSource {
    /// Start decoding `source` on a background thread, holding at most
    /// `lookahead` frames in memory.
    pub fn spawn<S>(mut source: S, lookahead: usize) -> Result<Self>
    where
        S: FrameSource + Send + 'static,
    {
        if lookahead == 0 {
            return Err(ReframeError::InvalidParameter(
                "Prefetch lookahead must be at least one frame".into(),
            ));
        }

        let frame_rate = source.frame_rate();
        let frame_count = source.frame_count();
        let dimensions = source.dimensions();
        let position = source.position();

        let (tx, rx) = bounded::<FrameMessage>(lookahead);
        let stop = Arc::new(AtomicBool::new(false));
        let worker_stop = Arc::clone(&stop);

        let worker = thread::Builder::new()
            .name("reframe-prefetch".into())
            .spawn(move || {
                while !worker_stop.load(Ordering::Relaxed) {
                    let message = source.next_frame();
                    let done = !matches!(message, Ok(Some(_)));
                    if tx.send(message).is_err() || done {
                        break;
                    }
                }
                trace!(position = source.position(), "Prefetch worker exiting");
            })?;

        debug!(lookahead, "Started prefetch worker");

        Ok(Self {
            frames: rx,
            stop,
            worker: Some(worker),
            frame_rate,
            frame_count,
            dimensions,
            position,
            exhausted: false,
        })
    }

    /// Number of frames decoded and waiting.
    pub fn buffered(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for PrefetchSource {
    fn frame_rate(&self) -> FrameRate {
        self.frame_rate
    }

    fn frame_count(&self) -> Option<u64> {
        self.frame_count
    }

    fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn next_frame(&mut self) -> Result<Option<FrameBuffer>> {
        if self.exhausted {
            return Ok(None);
        }
        match self.frames.recv() {
            Ok(Ok(Some(frame))) => {
                self.position += 1;
                Ok(Some(frame))
            }
            Ok(other) => {
                self.exhausted = true;
                other
            }
            Err(_) => {
                self.exhausted = true;
                Err(ReframeError::Internal(
                    "Prefetch worker stopped without signalling end of stream".into(),
                ))
            }
        }
    }
}

impl Drop for PrefetchSource {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        // Unblock a worker waiting on a full queue.
        while self.frames.try_recv().is_ok() {}
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
