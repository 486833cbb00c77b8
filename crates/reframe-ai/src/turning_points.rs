//! Turning-point compression of a per-frame position signal.
//!
//! Reduces a horizontal-center track to the indices where the camera should
//! start, stop or reverse a pan. Boxes are then held between consecutive
//! turning points.

use std::collections::BTreeSet;

/// Thresholds for turning-point detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurningPointParams {
    /// Per-step change counted as movement.
    pub min_change: f64,
    /// Accumulated movement that forces a turning point.
    pub max_drift: f64,
}

impl Default for TurningPointParams {
    fn default() -> Self {
        Self {
            min_change: 0.15,
            max_drift: 0.5,
        }
    }
}

/// Sorted, de-duplicated turning point indices of `data`.
///
/// Index 0 and the last index are always present for non-empty input.
pub fn compute_turning_points(data: &[f64], params: TurningPointParams) -> Vec<usize> {
    if data.is_empty() {
        return Vec::new();
    }

    let mut points = BTreeSet::new();
    points.insert(0);

    let mut direction = 0i8;
    let mut drift = 0.0f64;

    for (i, step) in data.windows(2).enumerate() {
        let d = step[1] - step[0];

        if drift.abs() > params.max_drift {
            drift = 0.0;
            direction = 0;
            points.insert(i);
        }

        if d.abs() < params.min_change {
            // Pause
            if direction != 0 {
                drift = 0.0;
                points.insert(i);
            }
            direction = 0;
        }

        if d > params.min_change {
            if direction != 1 {
                drift = 0.0;
                points.insert(i);
            }
            direction = 1;
        } else if d < -params.min_change {
            if direction != -1 {
                drift = 0.0;
                points.insert(i);
            }
            direction = -1;
        }

        drift += d;
    }

    points.insert(data.len() - 1);
    points.into_iter().collect()
}
