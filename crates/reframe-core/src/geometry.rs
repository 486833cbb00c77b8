//! Geometric primitives for centroids and crop rectangles.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// 2D point in pixel space (double precision, centroids are sub-pixel).
pub type Point2 = DVec2;

/// Axis-aligned rectangle stored as its two corners.
///
/// Used both for pixel-space crops and for crops normalized to `[0, 1]`.
/// Serializes as `[xmin, ymin, xmax, ymax]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Rect {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Rect {
    /// Create a new rectangle from its corners.
    #[inline]
    pub const fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Width of the rectangle.
    #[inline]
    pub fn width(self) -> f64 {
        self.xmax - self.xmin
    }

    /// Height of the rectangle.
    #[inline]
    pub fn height(self) -> f64 {
        self.ymax - self.ymin
    }

    /// Center point.
    #[inline]
    pub fn center(self) -> Point2 {
        Point2::new((self.xmin + self.xmax) * 0.5, (self.ymin + self.ymax) * 0.5)
    }

    /// Euclidean distance between the centers of two rectangles.
    #[inline]
    pub fn center_distance(self, other: Self) -> f64 {
        self.center().distance(other.center())
    }

    /// Divide each coordinate by the matching frame dimension.
    pub fn normalized(self, size: FrameSize) -> Self {
        Self::new(
            self.xmin / size.width,
            self.ymin / size.height,
            self.xmax / size.width,
            self.ymax / size.height,
        )
    }

    /// Whether the rectangle lies inside `[0, width] x [0, height]` and is non-empty.
    pub fn is_within(self, size: FrameSize) -> bool {
        self.xmin >= 0.0
            && self.ymin >= 0.0
            && self.xmax <= size.width
            && self.ymax <= size.height
            && self.xmin < self.xmax
            && self.ymin < self.ymax
    }

    /// Corners as `[xmin, ymin, xmax, ymax]`.
    #[inline]
    pub fn to_array(self) -> [f64; 4] {
        [self.xmin, self.ymin, self.xmax, self.ymax]
    }
}

impl From<Rect> for [f64; 4] {
    fn from(rect: Rect) -> Self {
        rect.to_array()
    }
}

impl From<[f64; 4]> for Rect {
    fn from(c: [f64; 4]) -> Self {
        Self::new(c[0], c[1], c[2], c[3])
    }
}

/// Size of the frame crops are projected into.
///
/// Stored height-first: the projector reasons about the working buffer as
/// `(height, width)` and its landscape check is `height / width < 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameSize {
    pub height: f64,
    pub width: f64,
}

impl FrameSize {
    /// Create a new frame size.
    #[inline]
    pub const fn new(height: f64, width: f64) -> Self {
        Self { height, width }
    }

    /// Working buffer whose width is derived from `height * aspect`.
    ///
    /// With the default decode height of 224 and a 16:9 aspect this yields
    /// the 224x398 buffer crops are computed in.
    #[inline]
    pub fn from_height_and_aspect(height: f64, aspect: f64) -> Self {
        Self::new(height, height * aspect)
    }

    /// Height over width.
    #[inline]
    pub fn height_over_width(self) -> f64 {
        self.height / self.width
    }

    /// Whether the frame is landscape (wider than tall).
    #[inline]
    pub fn is_landscape(self) -> bool {
        self.height_over_width() < 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_center_and_distance() {
        let a = Rect::new(0.0, 0.0, 2.0, 2.0);
        let b = Rect::new(3.0, 4.0, 5.0, 6.0);
        assert_eq!(a.center(), Point2::new(1.0, 1.0));
        assert!((a.center_distance(b) - (9.0f64 + 16.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_normalize_divides_by_width_and_height() {
        let size = FrameSize::new(200.0, 400.0);
        let n = Rect::new(100.0, 0.0, 200.0, 200.0).normalized(size);
        assert_eq!(n.to_array(), [0.25, 0.0, 0.5, 1.0]);
    }

    #[test]
    fn test_working_frame_is_landscape() {
        let size = FrameSize::from_height_and_aspect(224.0, 16.0 / 9.0);
        assert!((size.width - 398.222).abs() < 0.001);
        assert!(size.is_landscape());
        assert!(!FrameSize::new(400.0, 224.0).is_landscape());
    }

    #[test]
    fn test_is_within_rejects_empty_and_overflowing() {
        let size = FrameSize::new(10.0, 20.0);
        assert!(Rect::new(0.0, 0.0, 20.0, 10.0).is_within(size));
        assert!(!Rect::new(5.0, 0.0, 5.0, 10.0).is_within(size));
        assert!(!Rect::new(-1.0, 0.0, 5.0, 10.0).is_within(size));
        assert!(!Rect::new(0.0, 0.0, 21.0, 10.0).is_within(size));
    }

    proptest::proptest! {
        #[test]
        fn prop_normalized_rect_lands_in_unit_square(
            x0 in 0.0f64..300.0,
            w in 1.0f64..98.0,
            y0 in 0.0f64..100.0,
            h in 1.0f64..100.0,
        ) {
            let size = FrameSize::new(200.0, 400.0);
            let n = Rect::new(x0, y0, x0 + w, y0 + h).normalized(size);
            proptest::prop_assert!(n.is_within(FrameSize::new(1.0, 1.0)));
        }
    }
}
