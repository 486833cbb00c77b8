//! Time representation for frame-accurate scene bounds
//!
//! Uses rational numbers so scene boundaries at NTSC rates do not drift.
//! Crop boxes carry plain `f64` seconds; conversion happens at the edge.

use crate::error::{ReframeError, Result};
use num_rational::Rational64;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A rational time value representing a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RationalTime {
    /// Time value as a rational number (seconds)
    value: Rational64,
}

impl RationalTime {
    /// Create a RationalTime from a frame number and frame rate.
    #[inline]
    pub fn from_frames(frames: i64, rate: FrameRate) -> Self {
        Self {
            value: Rational64::new(frames * rate.denominator as i64, rate.numerator as i64),
        }
    }

    /// Convert to seconds as f64.
    #[inline]
    pub fn to_seconds_f64(self) -> f64 {
        *self.value.numer() as f64 / *self.value.denom() as f64
    }
}

/// Frame rate as a rational number (e.g., 30000/1001 for 29.97 fps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRate {
    /// Numerator (e.g., 30000)
    pub numerator: u32,
    /// Denominator (e.g., 1001)
    pub denominator: u32,
}

impl FrameRate {
    /// Create a new frame rate.
    #[inline]
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Approximate a floating-point rate with millisecond precision.
    pub fn from_fps_f64(fps: f64) -> Result<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(ReframeError::InvalidParameter(format!(
                "Frame rate must be positive, got {fps}"
            )));
        }
        if (fps - fps.round()).abs() < 1e-9 {
            return Ok(Self::new(fps.round() as u32, 1));
        }
        Ok(Self::new((fps * 1000.0).round() as u32, 1000))
    }

    /// Convert to frames per second as f64.
    #[inline]
    pub fn to_fps_f64(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Timestamp in seconds of the given frame index.
    #[inline]
    pub fn frames_to_seconds(self, frames: u64) -> f64 {
        RationalTime::from_frames(frames as i64, self).to_seconds_f64()
    }

    /// Number of whole frames spanning `seconds`, rounded to nearest.
    #[inline]
    pub fn seconds_to_frames(self, seconds: f64) -> u64 {
        (seconds * self.to_fps_f64()).round().max(0.0) as u64
    }

    /// Common frame rates
    pub const FPS_25: Self = Self::new(25, 1);
    pub const FPS_29_97: Self = Self::new(30000, 1001);
    pub const FPS_30: Self = Self::new(30, 1);
}

/// Parses ffprobe-style rates: `"30000/1001"`, `"25/1"` or `"29.97"`.
impl FromStr for FrameRate {
    type Err = ReframeError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ReframeError::InvalidParameter(format!("Invalid frame rate: {s:?}"));
        let s = s.trim();
        match s.split_once('/') {
            Some((num, den)) => {
                let numerator: u32 = num.trim().parse().map_err(|_| invalid())?;
                let denominator: u32 = den.trim().parse().map_err(|_| invalid())?;
                if numerator == 0 || denominator == 0 {
                    return Err(invalid());
                }
                let reduced = Rational64::new(numerator as i64, denominator as i64);
                Ok(Self::new(*reduced.numer() as u32, *reduced.denom() as u32))
            }
            None => {
                let fps: f64 = s.parse().map_err(|_| invalid())?;
                Self::from_fps_f64(fps)
            }
        }
    }
}
