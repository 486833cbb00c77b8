//! Salient-region centroid extraction.
//!
//! The 8-bit saliency map is thresholded, split into 8-connected
//! components, and the component with the highest mean intensity wins. A
//! small bright region beats a large dim one.

use crate::error::{AiError, AiResult};
use crate::saliency::IntensityMap;
use image::Luma;
use imageproc::contrast::{threshold, ThresholdType};
use imageproc::region_labelling::{connected_components as label_regions, Connectivity};
use reframe_core::Point2;
use smallvec::SmallVec;
use tracing::{debug, warn};

/// Accumulated statistics of one connected component.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ComponentStats {
    /// Label, numbered from 1 in raster order of each component's first pixel.
    pub label: u32,
    pub area: u64,
    sum_x: f64,
    sum_y: f64,
    sum_intensity: u64,
}

impl ComponentStats {
    /// Mean map intensity over the component's pixels.
    pub fn mean_intensity(&self) -> f64 {
        self.sum_intensity as f64 / self.area as f64
    }

    /// Mean pixel coordinate.
    pub fn centroid(&self) -> Point2 {
        Point2::new(self.sum_x / self.area as f64, self.sum_y / self.area as f64)
    }
}

pub type Components = SmallVec<[ComponentStats; 8]>;

/// 8-connected components of the pixels brighter than `min_intensity`.
pub fn connected_components(map: &IntensityMap, min_intensity: u8) -> Components {
    let mask = threshold(map, min_intensity, ThresholdType::Binary);
    let labels = label_regions(&mask, Connectivity::Eight, Luma([0u8]));

    let mut stats = Components::new();
    for ((x, y, &Luma([label])), &Luma([value])) in labels.enumerate_pixels().zip(map.pixels()) {
        if label == 0 {
            continue;
        }
        let idx = label as usize - 1;
        while stats.len() <= idx {
            stats.push(ComponentStats {
                label: stats.len() as u32 + 1,
                ..Default::default()
            });
        }
        let s = &mut stats[idx];
        s.area += 1;
        s.sum_x += x as f64;
        s.sum_y += y as f64;
        s.sum_intensity += value as u64;
    }
    stats
}

/// Centroid of the component with the highest mean intensity, or `None`
/// when nothing exceeds `min_intensity`. Ties keep the earliest component.
pub fn compute_highest_intensity_component(map: &IntensityMap, min_intensity: u8) -> Option<Point2> {
    let components = connected_components(map, min_intensity);
    let mut best: Option<&ComponentStats> = None;
    for c in &components {
        if best.map_or(true, |b| c.mean_intensity() > b.mean_intensity()) {
            best = Some(c);
        }
    }
    best.map(ComponentStats::centroid)
}

/// Threshold relaxation policy for centroid extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CentroidExtractor {
    pub min_intensity: u8,
    pub floor: u8,
    pub step: u8,
}

impl Default for CentroidExtractor {
    fn default() -> Self {
        Self {
            min_intensity: 50,
            floor: 0,
            step: 5,
        }
    }
}

impl CentroidExtractor {
    /// Thresholds tried in order, ending at the floor.
    pub fn thresholds(&self) -> impl Iterator<Item = u8> {
        let (floor, step) = (self.floor, self.step.max(1));
        let mut next = Some(self.min_intensity.max(floor));
        std::iter::from_fn(move || {
            let current = next?;
            next = (current > floor).then(|| current.saturating_sub(step).max(floor));
            Some(current)
        })
    }

    /// Centroid of the salient region in `map`, lowering the threshold
    /// until some pixel passes it.
    pub fn extract(&self, map: &IntensityMap, window: usize) -> AiResult<Point2> {
        for threshold in self.thresholds() {
            if let Some(centroid) = compute_highest_intensity_component(map, threshold) {
                if threshold < self.min_intensity {
                    debug!(window, threshold, "Centroid found after relaxing threshold");
                }
                return Ok(centroid);
            }
        }
        warn!(window, floor = self.floor, "Saliency map has no salient region");
        Err(AiError::ExtractionExhausted {
            window,
            floor: self.floor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(rows: &[&[u8]]) -> IntensityMap {
        let data = rows.iter().flat_map(|r| r.iter().copied()).collect();
        IntensityMap::from_raw(rows[0].len() as u32, rows.len() as u32, data).unwrap()
    }

    #[test]
    fn test_diagonal_pixels_are_connected() {
        let m = map(&[&[90, 0, 0], &[0, 90, 0], &[0, 0, 90]]);
        let comps = connected_components(&m, 50);
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].area, 3);
        assert_eq!(comps[0].centroid(), Point2::new(1.0, 1.0));
    }

    #[test]
    fn test_u_shape_merges_into_one_label() {
        let m = map(&[&[90, 0, 90], &[90, 0, 90], &[90, 90, 90]]);
        let comps = connected_components(&m, 50);
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].area, 7);
    }

    #[test]
    fn test_labels_follow_raster_order() {
        let m = map(&[&[0, 0, 0, 200], &[60, 0, 0, 0], &[60, 0, 0, 0]]);
        let comps = connected_components(&m, 50);
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[0].centroid(), Point2::new(3.0, 0.0));
        assert_eq!(comps[1].centroid(), Point2::new(0.0, 1.5));
    }

    #[test]
    fn test_brightest_beats_largest() {
        let m = map(&[
            &[60, 60, 60, 0, 0, 0],
            &[60, 60, 60, 0, 0, 250],
            &[60, 60, 60, 0, 0, 0],
        ]);
        let c = compute_highest_intensity_component(&m, 50).unwrap();
        assert_eq!(c, Point2::new(5.0, 1.0));
    }

    #[test]
    fn test_ties_keep_first_component() {
        let m = map(&[&[100, 0, 100]]);
        let c = compute_highest_intensity_component(&m, 50).unwrap();
        assert_eq!(c, Point2::new(0.0, 0.0));
    }

    #[test]
    fn test_threshold_is_strict() {
        let m = map(&[&[50, 50]]);
        assert!(compute_highest_intensity_component(&m, 50).is_none());
        assert!(compute_highest_intensity_component(&m, 49).is_some());
    }

    #[test]
    fn test_thresholds_step_to_floor() {
        let ex = CentroidExtractor::default();
        let t: Vec<u8> = ex.thresholds().collect();
        assert_eq!(t.first(), Some(&50));
        assert_eq!(t.last(), Some(&0));
        assert_eq!(t.len(), 11);

        let uneven = CentroidExtractor {
            min_intensity: 12,
            floor: 3,
            step: 5,
        };
        assert_eq!(uneven.thresholds().collect::<Vec<_>>(), vec![12, 7, 3]);
    }

    #[test]
    fn test_relaxation_finds_dim_region() {
        let m = map(&[&[0, 30, 0]]);
        let c = CentroidExtractor::default().extract(&m, 0).unwrap();
        assert_eq!(c, Point2::new(1.0, 0.0));
    }

    #[test]
    fn test_blank_map_exhausts() {
        let m = map(&[&[0, 0, 0]]);
        let err = CentroidExtractor::default().extract(&m, 7).unwrap_err();
        assert!(matches!(err, AiError::ExtractionExhausted { window: 7, floor: 0 }));
    }
}
