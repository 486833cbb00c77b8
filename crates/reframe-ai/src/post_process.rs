//! Merging of scene boxes that are too short to hold a crop.

use crate::bbox::BBox;
use tracing::debug;

/// Merge every box shorter than `min_scene_len` seconds into whichever
/// neighbour's crop centre is nearer.
///
/// The preceding neighbour is the last box already emitted, so a short box
/// can absorb into a box that was itself extended earlier. A missing
/// neighbour counts as infinitely far; ties merge forward. The merged box
/// keeps the neighbour's crop and takes the scene-boundary flag of the later
/// of the two boxes. A lone short box with no neighbours is kept as is.
pub fn post_process_scene_bboxes(boxes: &[BBox], min_scene_len: f64) -> Vec<BBox> {
    let mut processed: Vec<BBox> = Vec::with_capacity(boxes.len());
    let mut i = 0;

    while i < boxes.len() {
        let current = boxes[i];
        if current.duration() >= min_scene_len {
            processed.push(current);
            i += 1;
            continue;
        }

        let prev_dist = processed
            .last()
            .map_or(f64::INFINITY, |p| current.bbox.center_distance(p.bbox));
        let next = boxes.get(i + 1).copied();
        let next_dist = next.map_or(f64::INFINITY, |n| current.bbox.center_distance(n.bbox));

        if prev_dist < next_dist {
            if let Some(prev) = processed.last_mut() {
                debug!(start = current.start_time, end = current.end_time, "Merging short scene backward");
                prev.end_time = current.end_time;
                prev.is_scene_boundary = current.is_scene_boundary;
            }
            i += 1;
        } else if let Some(next) = next {
            debug!(start = current.start_time, end = current.end_time, "Merging short scene forward");
            processed.push(BBox::new(
                current.start_time,
                next.end_time,
                next.bbox,
                next.is_scene_boundary,
            ));
            i += 2;
        } else {
            processed.push(current);
            i += 1;
        }
    }

    processed
}
