//! Cluster smoothing of per-window centroids.
//!
//! Consecutive centroids that stay close form a cluster, represented by its
//! coordinate-wise median. Each cluster expands back to frame resolution as
//! either a linear ramp toward the next cluster (when the two are close) or
//! a constant hold.

use crate::error::{AiError, AiResult};
use reframe_core::Point2;
use tracing::trace;

/// How a segment was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Linear ramp from this cluster's median to the next one's.
    Interpolated,
    /// Constant run at the cluster median.
    Held,
}

/// One cluster's contribution to the frame-resolution track.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothedSegment {
    pub kind: SegmentKind,
    pub points: Vec<Point2>,
}

impl SmoothedSegment {
    fn held(at: Point2, len: usize) -> Self {
        Self {
            kind: SegmentKind::Held,
            points: vec![at; len],
        }
    }

    fn ramp(from: Point2, to: Point2, len: usize) -> Self {
        let points = if len == 1 {
            vec![from]
        } else {
            let span = (len - 1) as f64;
            (0..len).map(|k| from.lerp(to, k as f64 / span)).collect()
        };
        Self {
            kind: SegmentKind::Interpolated,
            points,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First point of the segment, which positions the segment's crop.
    pub fn first(&self) -> Option<Point2> {
        self.points.first().copied()
    }
}

/// Split `centroids` into runs whose consecutive distance is at most
/// `threshold`.
pub fn cluster_centroids(centroids: &[Point2], threshold: f64) -> Vec<&[Point2]> {
    let mut clusters = Vec::new();
    let mut start = 0;
    for i in 1..centroids.len() {
        if centroids[i].distance(centroids[i - 1]) > threshold {
            clusters.push(&centroids[start..i]);
            start = i;
        }
    }
    if start < centroids.len() {
        clusters.push(&centroids[start..]);
    }
    clusters
}

/// Coordinate-wise median; even-length runs average the two middle values.
pub fn coordinate_median(points: &[Point2]) -> Option<Point2> {
    fn median(mut values: Vec<f64>) -> f64 {
        values.sort_by(f64::total_cmp);
        let mid = values.len() / 2;
        if values.len() % 2 == 0 {
            (values[mid - 1] + values[mid]) / 2.0
        } else {
            values[mid]
        }
    }
    if points.is_empty() {
        return None;
    }
    Some(Point2::new(
        median(points.iter().map(|p| p.x).collect()),
        median(points.iter().map(|p| p.y).collect()),
    ))
}

/// Cluster `centroids` and expand each cluster to `len * stride` samples.
pub fn compute_smoothed_centroids(
    centroids: &[Point2],
    stride: usize,
    cluster_threshold: f64,
    smoothing_threshold: f64,
) -> AiResult<Vec<SmoothedSegment>> {
    if centroids.is_empty() {
        return Err(AiError::invalid("cannot smooth an empty centroid track"));
    }
    if stride == 0 {
        return Err(AiError::invalid("stride must be at least 1"));
    }

    let clusters = cluster_centroids(centroids, cluster_threshold);
    let medians: Vec<Point2> = clusters
        .iter()
        .filter_map(|c| coordinate_median(c))
        .collect();

    let mut segments = Vec::with_capacity(clusters.len());
    for (i, cluster) in clusters.iter().enumerate() {
        let len = cluster.len() * stride;
        let segment = match medians.get(i + 1) {
            Some(&next) if medians[i].distance(next) <= smoothing_threshold => {
                SmoothedSegment::ramp(medians[i], next, len)
            }
            _ => SmoothedSegment::held(medians[i], len),
        };
        trace!(cluster = i, size = cluster.len(), kind = ?segment.kind, "Expanded cluster");
        segments.push(segment);
    }
    Ok(segments)
}

/// Total samples across segments.
pub fn total_len(segments: &[SmoothedSegment]) -> usize {
    segments.iter().map(SmoothedSegment::len).sum()
}

/// Drop samples from the tail until at most `frame_count` remain.
pub fn trim_to_frame_count(segments: &mut Vec<SmoothedSegment>, frame_count: usize) {
    let mut excess = total_len(segments).saturating_sub(frame_count);
    while excess > 0 {
        let Some(last) = segments.last_mut() else {
            break;
        };
        let cut = excess.min(last.len());
        last.points.truncate(last.len() - cut);
        excess -= cut;
        if last.is_empty() {
            segments.pop();
        }
    }
}
