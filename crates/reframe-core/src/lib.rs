//! Reframe Core - Foundation types for saliency-guided reframing
//!
//! This crate provides the fundamental types used throughout the pipeline:
//! - Time representation (RationalTime, FrameRate)
//! - Frame buffers and pixel formats
//! - Geometric primitives (points, corner rectangles, working frame sizes)

pub mod error;
pub mod frame;
pub mod geometry;
pub mod time;

pub use error::{ReframeError, Result};
pub use frame::{FrameBuffer, FramePlane, PixelFormat};
pub use geometry::{FrameSize, Point2, Rect};
pub use time::{FrameRate, RationalTime};

/// Fixed geometry of the decode and working buffers.
pub mod working_frame {
    /// Width frames are decoded at before saliency inference.
    pub const DECODE_WIDTH: u32 = 384;

    /// Height frames are decoded at before saliency inference.
    pub const DECODE_HEIGHT: u32 = 224;

    /// Aspect ratio the decode buffer is re-interpreted at when projecting
    /// crop boxes (224x384 is treated as 224x398).
    pub const WORKING_ASPECT: f64 = 16.0 / 9.0;

    /// Number of frames fed to the saliency model per window.
    pub const TEMPORAL_LEN: usize = 32;
}
