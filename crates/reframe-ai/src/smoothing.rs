//! Centroid smoothing: median filtering, gap interpolation and upsampling to
//! frame resolution.

use crate::error::{AiError, AiResult};
use reframe_core::Point2;

/// Median filter with an odd `kernel`, replicating edge samples.
pub fn median_filter(values: &[f64], kernel: usize) -> AiResult<Vec<f64>> {
    if kernel % 2 == 0 {
        return Err(AiError::invalid(format!(
            "median kernel must be odd, got {kernel}"
        )));
    }
    if values.is_empty() || kernel == 1 {
        return Ok(values.to_vec());
    }

    let half = kernel / 2;
    let last = values.len() - 1;
    let mut window = Vec::with_capacity(kernel);
    let filtered = (0..values.len())
        .map(|i| {
            window.clear();
            window.extend((0..kernel).map(|k| {
                let j = (i + k).saturating_sub(half).min(last);
                values[j]
            }));
            window.sort_by(f64::total_cmp);
            window[half]
        })
        .collect();
    Ok(filtered)
}

/// Median filter applied to each coordinate independently.
pub fn median_filter_centroids(centroids: &[Point2], kernel: usize) -> AiResult<Vec<Point2>> {
    let xs: Vec<f64> = centroids.iter().map(|c| c.x).collect();
    let ys: Vec<f64> = centroids.iter().map(|c| c.y).collect();
    let xs = median_filter(&xs, kernel)?;
    let ys = median_filter(&ys, kernel)?;
    Ok(xs.into_iter().zip(ys).map(|(x, y)| Point2::new(x, y)).collect())
}

/// Fill unknown samples.
///
/// Gaps between two known samples are filled linearly; leading and trailing
/// gaps repeat the nearest known sample. Input without any known sample is
/// returned unchanged.
pub fn interpolate_bounding_boxes(samples: &[Option<Point2>]) -> Vec<Option<Point2>> {
    let known: Vec<usize> = samples
        .iter()
        .enumerate()
        .filter_map(|(i, s)| s.map(|_| i))
        .collect();
    let (Some(&first), Some(&last)) = (known.first(), known.last()) else {
        return samples.to_vec();
    };

    let mut out = samples.to_vec();
    out[..first].fill(samples[first]);
    out[last..].fill(samples[last]);

    for pair in known.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        let gap = end - start;
        if let (Some(a), Some(b)) = (samples[start], samples[end]) {
            for k in 1..gap {
                out[start + k] = Some(a.lerp(b, k as f64 / gap as f64));
            }
        }
    }
    out
}

/// Spread one centroid per window to one per frame.
///
/// Centroid `k` lands on frame `k * stride`; frames in between are
/// interpolated and frames after the last centroid hold it.
pub fn upsample_centroids(centroids: &[Point2], stride: usize) -> AiResult<Vec<Point2>> {
    if stride == 0 {
        return Err(AiError::invalid("stride must be at least 1"));
    }
    let mut sparse = vec![None; centroids.len() * stride];
    for (k, &c) in centroids.iter().enumerate() {
        sparse[k * stride] = Some(c);
    }
    Ok(interpolate_bounding_boxes(&sparse).into_iter().flatten().collect())
}

/// Frame-resolution centroid track for one scene.
///
/// The raw centroids are upsampled, median filtered and fitted to
/// `frame_count` samples: trimmed from the tail when longer, extended with
/// the last sample when the decoder delivered fewer frames than expected.
pub fn tracking_signal(
    raw: &[Point2],
    stride: usize,
    kernel: usize,
    frame_count: usize,
) -> AiResult<Vec<Point2>> {
    let upsampled = upsample_centroids(raw, stride)?;
    let mut signal = median_filter_centroids(&upsampled, kernel)?;
    fit_to_length(&mut signal, frame_count);
    Ok(signal)
}

pub(crate) fn fit_to_length(signal: &mut Vec<Point2>, len: usize) {
    if let Some(&last) = signal.last() {
        signal.resize(len, last);
    }
}
