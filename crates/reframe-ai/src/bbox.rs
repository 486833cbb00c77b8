//! Crop boxes for portrait and square output.
//!
//! A box is the tallest crop of the target aspect ratio that fits the
//! working frame, centred horizontally on a tracked position.

use crate::error::AiResult;
use reframe_core::{FrameSize, Rect, ReframeError};
use serde::{Deserialize, Serialize};

/// Output aspect ratios.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TargetAspect {
    /// 9:16 vertical.
    Portrait,
    /// 1:1.
    Square,
}

impl TargetAspect {
    /// Width over height.
    pub fn ratio(self) -> f64 {
        match self {
            Self::Portrait => 9.0 / 16.0,
            Self::Square => 1.0,
        }
    }
}

/// A normalized crop held for a time range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    /// Start of the range in seconds.
    pub start_time: f64,
    /// End of the range in seconds.
    pub end_time: f64,
    /// Crop corners, each divided by the working frame width or height.
    pub bbox: Rect,
    /// Whether the range starts a detected scene.
    pub is_scene_boundary: bool,
}

impl BBox {
    pub fn new(start_time: f64, end_time: f64, bbox: Rect, is_scene_boundary: bool) -> Self {
        Self {
            start_time,
            end_time,
            bbox,
            is_scene_boundary,
        }
    }

    /// Length of the time range in seconds.
    #[inline]
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Fail unless `size` is wider than it is tall.
pub fn check_landscape(size: FrameSize) -> AiResult<()> {
    if size.is_landscape() {
        Ok(())
    } else {
        Err(ReframeError::Precondition(format!(
            "working frame {}x{} is not landscape",
            size.width, size.height
        ))
        .into())
    }
}

/// Largest crop of `aspect` (width over height) in `size`, centred on
/// `hcenter` and shifted rather than shrunk when it would leave the frame.
///
/// Coordinates are truncated to whole pixels.
pub fn compute_portrait_from_hcenter(hcenter: f64, size: FrameSize, aspect: f64) -> AiResult<Rect> {
    check_landscape(size)?;
    if !aspect.is_finite() || aspect <= 0.0 {
        return Err(ReframeError::InvalidParameter(format!(
            "aspect ratio must be positive, got {aspect}"
        ))
        .into());
    }
    if !hcenter.is_finite() {
        return Err(ReframeError::InvalidParameter(format!(
            "horizontal center must be finite, got {hcenter}"
        ))
        .into());
    }

    let new_width = aspect * size.height;
    if new_width > size.width {
        return Err(ReframeError::InvalidParameter(format!(
            "a {aspect} crop of height {} does not fit width {}",
            size.height, size.width
        ))
        .into());
    }

    let half = (new_width / 2.0).floor();
    let (mut xmin, mut xmax) = (hcenter - half, hcenter + half);
    if xmin < 0.0 {
        xmin = 0.0;
        xmax = new_width;
    } else if xmax > size.width {
        xmax = size.width;
        xmin = xmax - new_width;
    }

    Ok(Rect::new(xmin.trunc(), 0.0, xmax.trunc(), size.height.trunc()))
}

/// Crop for `hcenter` normalized to the unit square.
pub fn project(hcenter: f64, size: FrameSize, target: TargetAspect) -> AiResult<Rect> {
    Ok(compute_portrait_from_hcenter(hcenter, size, target.ratio())?.normalized(size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AiError;

    fn working() -> FrameSize {
        FrameSize::from_height_and_aspect(224.0, 16.0 / 9.0)
    }

    #[test]
    fn test_centered_portrait_crop() {
        let rect = compute_portrait_from_hcenter(200.0, working(), 9.0 / 16.0).unwrap();
        // 126 wide, half = 63
        assert_eq!(rect.to_array(), [137.0, 0.0, 263.0, 224.0]);
    }

    #[test]
    fn test_crop_shifts_at_left_edge() {
        let rect = compute_portrait_from_hcenter(10.0, working(), 9.0 / 16.0).unwrap();
        assert_eq!(rect.to_array(), [0.0, 0.0, 126.0, 224.0]);
    }

    #[test]
    fn test_crop_shifts_at_right_edge() {
        let size = working();
        let rect = compute_portrait_from_hcenter(395.0, size, 1.0).unwrap();
        assert_eq!(rect.xmax, size.width.trunc());
        assert_eq!(rect.xmin, (size.width - 224.0).trunc());
    }

    #[test]
    fn test_non_landscape_is_rejected() {
        let err = compute_portrait_from_hcenter(50.0, FrameSize::new(400.0, 224.0), 9.0 / 16.0)
            .unwrap_err();
        assert!(matches!(err, AiError::Reframe(ReframeError::Precondition(_))));
    }

    #[test]
    fn test_oversized_aspect_is_rejected() {
        assert!(compute_portrait_from_hcenter(100.0, working(), 2.0).is_err());
        assert!(compute_portrait_from_hcenter(100.0, working(), 0.0).is_err());
    }

    #[test]
    fn test_project_normalizes() {
        let rect = project(200.0, working(), TargetAspect::Portrait).unwrap();
        assert!((rect.xmin - 137.0 / working().width).abs() < 1e-12);
        assert_eq!(rect.ymin, 0.0);
        assert_eq!(rect.ymax, 1.0);
    }

    #[test]
    fn test_bbox_json_shape() {
        let bbox = BBox::new(0.0, 1.5, Rect::new(0.25, 0.0, 0.5, 1.0), true);
        let json = serde_json::to_value(bbox).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "start_time": 0.0,
                "end_time": 1.5,
                "bbox": [0.25, 0.0, 0.5, 1.0],
                "is_scene_boundary": true
            })
        );
        let back: BBox = serde_json::from_value(json).unwrap();
        assert_eq!(back, bbox);
    }

    proptest::proptest! {
        #[test]
        fn prop_crop_stays_inside_frame(
            hcenter in 0.0f64..398.0,
            square in proptest::bool::ANY,
        ) {
            let size = working();
            let aspect = if square { 1.0 } else { 9.0 / 16.0 };
            let rect = compute_portrait_from_hcenter(hcenter, size, aspect).unwrap();
            proptest::prop_assert!(rect.is_within(size));
            let expected = aspect * size.height;
            proptest::prop_assert!((rect.width() - expected).abs() <= 2.0);
        }
    }
}
