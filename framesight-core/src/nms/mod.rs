//! nms — greedy per-class non-maximum suppression
//!
//! Runs only on the legacy decode path; the end-to-end layout arrives already
//! suppressed. Candidates of different classes never suppress one another.

use std::cmp::Ordering;

use tracing::trace;

use crate::geometry::RawDetection;

/// Filter `candidates` so that no two retained boxes of the same class have
/// IoU above `iou_threshold`, preferring higher confidence.
///
/// The sort must be stable: equal-confidence candidates keep their encounter
/// order, which makes the greedy pass deterministic. Quadratic in the number
/// of above-threshold candidates, which is small after confidence filtering.
pub fn suppress(mut candidates: Vec<RawDetection>, iou_threshold: f32) -> Vec<RawDetection> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });

    let mut kept: Vec<RawDetection> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let overlaps_kept = kept.iter().any(|accepted| {
            accepted.class_id == candidate.class_id
                && candidate.bounds.iou(&accepted.bounds) > iou_threshold
        });
        if !overlaps_kept {
            kept.push(candidate);
        }
    }
    trace!(kept = kept.len(), "suppression complete");
    kept
}
