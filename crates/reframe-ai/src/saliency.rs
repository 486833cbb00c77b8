//! Saliency model contract and map post-processing.
//!
//! A model turns a window of frames into one saliency map with values in
//! `[0, 1]`. The pipeline blurs the map and quantizes it to 8 bits before
//! looking for the salient region.

use crate::error::{AiError, AiResult};
use crate::window::Window;
use image::{GrayImage, ImageBuffer, Luma};
use imageproc::definitions::Image;
use rayon::prelude::*;

/// Single-channel saliency map, row-major, values in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    image: Image<Luma<f32>>,
}

impl Heatmap {
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> AiResult<Self> {
        if width == 0 || height == 0 {
            return Err(AiError::InferenceError(format!(
                "saliency map must be non-empty, got {width}x{height}"
            )));
        }
        let len = data.len();
        if len != width as usize * height as usize {
            return Err(AiError::InferenceError(format!(
                "saliency map has {len} values, expected {width}x{height}"
            )));
        }
        ImageBuffer::from_raw(width, height, data)
            .map(|image| Self { image })
            .ok_or_else(|| AiError::InferenceError(format!("saliency map {width}x{height} overflows")))
    }

    /// Map of `width` x `height` with every value produced by `f(x, y)`.
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> f32) -> AiResult<Self> {
        let data = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        Self::new(width, height, data)
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn data(&self) -> &[f32] {
        self.image.as_raw()
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.image.get_pixel(x, y)[0]
    }

    /// Clamp every value into `[0, 1]`.
    pub fn clamp_unit(mut self) -> Self {
        for Luma([v]) in self.image.pixels_mut() {
            *v = v.clamp(0.0, 1.0);
        }
        self
    }
}

/// 8-bit saliency map.
pub type IntensityMap = GrayImage;

/// A video saliency network.
pub trait SaliencyModel {
    /// Saliency map for the newest frame of `window`.
    fn infer(&mut self, window: &Window) -> AiResult<Heatmap>;

    /// Window length the network was trained with, when it has a fixed one.
    fn temporal_len(&self) -> Option<usize> {
        None
    }
}

impl<F> SaliencyModel for F
where
    F: FnMut(&Window) -> AiResult<Heatmap>,
{
    fn infer(&mut self, window: &Window) -> AiResult<Heatmap> {
        self(window)
    }
}

/// Pack a window as `[3, T, H, W]` floats scaled to `[-1, 1]`.
pub fn window_to_tensor_data(window: &Window) -> AiResult<Vec<f32>> {
    let (width, height) = window.dimensions();
    if window.frames.iter().any(|f| (f.width, f.height) != (width, height)) {
        return Err(AiError::InferenceError("window frames differ in size".into()));
    }
    let plane_len = width as usize * height as usize;
    let t = window.len();
    let mut data = vec![0f32; 3 * t * plane_len];
    if plane_len == 0 {
        return Ok(data);
    }

    // One chunk per (channel, frame) plane.
    data.par_chunks_mut(plane_len).enumerate().for_each(|(i, plane)| {
        let (c, frame) = (i / t, &window.frames[i % t]);
        for y in 0..height {
            let row = frame.plane().row(y);
            let out = &mut plane[y as usize * width as usize..(y as usize + 1) * width as usize];
            for (o, px) in out.iter_mut().zip(row.chunks_exact(3)) {
                *o = px[c] as f32 * 2.0 / 255.0 - 1.0;
            }
        }
    });
    Ok(data)
}

/// Gaussian blur of the map. A non-positive sigma leaves it untouched.
pub fn gaussian_blur(map: &Heatmap, sigma: f64) -> Heatmap {
    if sigma <= 0.0 {
        return map.clone();
    }
    Heatmap {
        image: imageproc::filter::gaussian_blur_f32(&map.image, sigma as f32),
    }
}

/// Scale a map to 8 bits, clamping to `[0, 1]` first and truncating.
pub fn to_intensity(map: &Heatmap) -> IntensityMap {
    GrayImage::from_fn(map.width(), map.height(), |x, y| {
        Luma([(map.get(x, y).clamp(0.0, 1.0) * 255.0) as u8])
    })
}

/// Blur then quantize, ready for centroid extraction.
pub fn postprocess(map: &Heatmap, sigma: f64) -> IntensityMap {
    to_intensity(&gaussian_blur(map, sigma))
}
