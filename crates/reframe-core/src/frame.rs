//! Frame buffer types for decoded video frames in CPU memory.
//!
//! Frames arrive from the decoder as tightly packed RGB24 and are kept in
//! that layout; freshly allocated buffers use 64-byte aligned rows.

use crate::error::{ReframeError, Result};
use serde::{Deserialize, Serialize};

/// Pixel format enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PixelFormat {
    /// 8-bit packed RGB (24 bits per pixel), the decoder's native output
    #[default]
    Rgb8,
}

impl PixelFormat {
    /// Bytes per pixel.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb8 => 3,
        }
    }

    /// Calculate total bytes needed for a tightly packed frame of this format.
    pub fn frame_size(self, width: u32, height: u32) -> usize {
        width as usize * height as usize * self.bytes_per_pixel()
    }
}

/// A plane of pixel data with stride information.
#[derive(Debug, Clone)]
pub struct FramePlane {
    /// Raw pixel data
    pub data: Vec<u8>,
    /// Bytes per row (may include padding)
    pub stride: usize,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    bytes_per_pixel: usize,
}

impl FramePlane {
    /// Create a zeroed plane with 64-byte aligned rows.
    pub fn new(width: u32, height: u32, bytes_per_pixel: usize) -> Self {
        let min_stride = (width as usize) * bytes_per_pixel;
        let stride = (min_stride + 63) & !63;
        Self {
            data: vec![0u8; stride * height as usize],
            stride,
            width,
            height,
            bytes_per_pixel,
        }
    }

    /// Wrap tightly packed pixel data without copying.
    pub fn packed(data: Vec<u8>, width: u32, height: u32, bytes_per_pixel: usize) -> Self {
        Self {
            data,
            stride: width as usize * bytes_per_pixel,
            width,
            height,
            bytes_per_pixel,
        }
    }

    /// Get a row of pixel data.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        let end = start + self.width as usize * self.bytes_per_pixel;
        &self.data[start..end]
    }

    #[inline]
    fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.stride;
        let end = start + self.width as usize * self.bytes_per_pixel;
        &mut self.data[start..end]
    }

    /// Bytes per pixel in this plane.
    #[inline]
    pub fn bytes_per_pixel(&self) -> usize {
        self.bytes_per_pixel
    }
}

/// A decoded video frame in CPU memory.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    /// Pixel format
    pub format: PixelFormat,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    plane: FramePlane,
}

impl FrameBuffer {
    /// Create a new zeroed frame buffer with the given dimensions and format.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            format,
            width,
            height,
            plane: FramePlane::new(width, height, format.bytes_per_pixel()),
        }
    }

    /// Adopt tightly packed pixel data, e.g. a raw frame read from an ffmpeg pipe.
    pub fn from_packed(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Result<Self> {
        let expected = format.frame_size(width, height);
        if data.len() != expected {
            return Err(ReframeError::Decoder(format!(
                "Frame payload is {} bytes, expected {} for {}x{} {:?}",
                data.len(),
                expected,
                width,
                height,
                format
            )));
        }
        Ok(Self {
            format,
            width,
            height,
            plane: FramePlane::packed(data, width, height, format.bytes_per_pixel()),
        })
    }

    /// Create an RGB frame filled with a single colour.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let mut frame = Self::new(width, height, PixelFormat::Rgb8);
        for y in 0..height {
            for px in frame.plane.row_mut(y).chunks_exact_mut(3) {
                px.copy_from_slice(&rgb);
            }
        }
        frame
    }

    /// The pixel plane.
    #[inline]
    pub fn plane(&self) -> &FramePlane {
        &self.plane
    }

    /// Channel values of the pixel at `(x, y)`.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let bpp = self.format.bytes_per_pixel();
        let start = x as usize * bpp;
        &self.plane.row(y)[start..start + bpp]
    }
}
