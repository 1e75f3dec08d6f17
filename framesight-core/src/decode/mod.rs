//! decode — raw output tensor → candidate boxes
//!
//! Two mutually exclusive strategies, selected by the model variant parsed at
//! load time. Both read the flat buffer with explicit stride arithmetic and
//! apply the confidence threshold (strictly greater-than keeps a candidate).
//!
//! An output whose shape does not match the active layout is a per-call,
//! non-fatal condition: the decoder returns `None` and the caller reports an
//! empty result rather than erroring out.

use tracing::{trace, warn};

use crate::geometry::{RawDetection, Rect};
use crate::metadata::{ModelInfo, ModelVariant};
use crate::tensor::OutputTensor;

/// Values per detection row in the end-to-end layout:
/// x1, y1, x2, y2, score, class.
const END_TO_END_ROW: usize = 6;
/// Coordinate rows (cx, cy, w, h) that precede the class rows in the legacy
/// layout.
const LEGACY_COORD_ROWS: usize = 4;

/// Decode `output` into model-space candidates, or `None` when the tensor
/// shape is not recognized for the model's layout.
pub fn decode(
    output: &OutputTensor,
    info: &ModelInfo,
    confidence_threshold: f32,
) -> Option<Vec<RawDetection>> {
    if !output.is_consistent() {
        warn!(shape = ?output.shape, len = output.data.len(), "output buffer does not match its shape");
        return None;
    }
    match info.variant {
        ModelVariant::EndToEnd => decode_end_to_end(output, confidence_threshold),
        ModelVariant::Legacy => decode_legacy(output, info.num_classes(), confidence_threshold),
    }
}

/// `[1, N, 6]` layout: one fully-formed row per detection, already suppressed
/// inside the graph. Only thresholding happens here.
fn decode_end_to_end(output: &OutputTensor, confidence_threshold: f32) -> Option<Vec<RawDetection>> {
    if output.shape.len() < 3 || output.shape[2] != END_TO_END_ROW {
        warn!(shape = ?output.shape, "unrecognized end-to-end output shape");
        return None;
    }
    let rows = output.shape[1];
    let data = &output.data;

    let mut detections = Vec::new();
    for i in 0..rows {
        let offset = i * END_TO_END_ROW;
        let score = data[offset + 4];
        if score <= confidence_threshold {
            continue;
        }
        let (x1, y1, x2, y2) = (data[offset], data[offset + 1], data[offset + 2], data[offset + 3]);
        detections.push(RawDetection {
            position: i,
            class_id: data[offset + 5] as usize,
            confidence: score,
            bounds: Rect::from_corners(x1, y1, x2, y2),
        });
    }
    trace!(kept = detections.len(), rows, "decoded end-to-end output");
    Some(detections)
}

/// `[1, 4+C, M]` layout, row stride B = M: confidence for (position p,
/// class c) lives at `(c+4)·B + p`, the shared center-form box at
/// `p, B+p, 2B+p, 3B+p`. Produces up to M×C candidates and therefore
/// requires suppression downstream.
fn decode_legacy(
    output: &OutputTensor,
    num_classes: usize,
    confidence_threshold: f32,
) -> Option<Vec<RawDetection>> {
    if output.shape.len() != 3 || output.shape[1] != LEGACY_COORD_ROWS + num_classes {
        warn!(
            shape = ?output.shape,
            num_classes, "unrecognized legacy output shape"
        );
        return None;
    }
    let stride = output.shape[2];
    let data = &output.data;

    let mut detections = Vec::new();
    for position in 0..stride {
        for class_id in 0..num_classes {
            let confidence = data[(class_id + LEGACY_COORD_ROWS) * stride + position];
            if confidence <= confidence_threshold {
                continue;
            }

            let cx = data[position];
            let cy = data[stride + position];
            let w = data[2 * stride + position];
            let h = data[3 * stride + position];
            // A zero-extent box is not a detection.
            if w == 0.0 || h == 0.0 {
                continue;
            }

            detections.push(RawDetection {
                position,
                class_id,
                confidence,
                bounds: Rect::from_center(cx, cy, w, h),
            });
        }
    }
    trace!(
        kept = detections.len(),
        positions = stride,
        "decoded legacy output"
    );
    Some(detections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn info(variant: ModelVariant, classes: &[&str]) -> ModelInfo {
        ModelInfo {
            input_size: crate::coords::ImageSize::new(640, 640),
            names: classes
                .iter()
                .enumerate()
                .map(|(i, n)| (i, n.to_string()))
                .collect::<HashMap<_, _>>(),
            variant,
            version: None,
        }
    }

    #[test]
    fn end_to_end_keeps_only_above_threshold() {
        // Two slots: one at 0.9 (kept), one at 0.2 (dropped).
        let output = OutputTensor::new(
            vec![1, 2, 6],
            vec![
                10.0, 20.0, 110.0, 220.0, 0.9, 2.0, //
                0.0, 0.0, 50.0, 50.0, 0.2, 1.0,
            ],
        );
        let info = info(ModelVariant::EndToEnd, &["a", "b", "c"]);
        let dets = decode(&output, &info, 0.3).unwrap();
        assert_eq!(dets.len(), 1);
        assert_eq!(dets[0].class_id, 2);
        assert_eq!(dets[0].confidence, 0.9);
        assert_eq!(dets[0].bounds, Rect::new(10.0, 20.0, 100.0, 200.0));
    }

    #[test]
    fn end_to_end_threshold_is_strict() {
        let output = OutputTensor::new(vec![1, 1, 6], vec![0.0, 0.0, 10.0, 10.0, 0.5, 0.0]);
        let info = info(ModelVariant::EndToEnd, &["a"]);
        // score == threshold is discarded.
        assert!(decode(&output, &info, 0.5).unwrap().is_empty());
    }

    #[test]
    fn end_to_end_rejects_wrong_trailing_dim() {
        let output = OutputTensor::new(vec![1, 2, 5], vec![0.0; 10]);
        let info = info(ModelVariant::EndToEnd, &["a"]);
        assert!(decode(&output, &info, 0.3).is_none());
    }

    /// Column-major legacy buffer for two positions and two classes.
    fn legacy_two_positions() -> OutputTensor {
        // rows: cx, cy, w, h, class0 conf, class1 conf; stride = 2
        OutputTensor::new(
            vec![1, 6, 2],
            vec![
                100.0, 300.0, // cx
                100.0, 300.0, // cy
                50.0, 80.0, // w
                50.0, 80.0, // h
                0.9, 0.0, // class 0 confidence
                0.0, 0.7, // class 1 confidence
            ],
        )
    }

    #[test]
    fn legacy_decodes_center_form_per_class() {
        let info = info(ModelVariant::Legacy, &["a", "b"]);
        let dets = decode(&legacy_two_positions(), &info, 0.3).unwrap();
        assert_eq!(dets.len(), 2);

        assert_eq!(dets[0].position, 0);
        assert_eq!(dets[0].class_id, 0);
        assert_eq!(dets[0].bounds, Rect::new(75.0, 75.0, 50.0, 50.0));

        assert_eq!(dets[1].position, 1);
        assert_eq!(dets[1].class_id, 1);
        assert_eq!(dets[1].bounds, Rect::new(260.0, 260.0, 80.0, 80.0));
    }

    #[test]
    fn legacy_skips_zero_extent_boxes() {
        let output = OutputTensor::new(
            vec![1, 5, 1],
            vec![100.0, 100.0, 0.0, 50.0, 0.9],
        );
        let info = info(ModelVariant::Legacy, &["a"]);
        assert!(decode(&output, &info, 0.3).unwrap().is_empty());
    }

    #[test]
    fn legacy_rejects_row_count_mismatch() {
        // 2 classes declared but only 5 rows present.
        let output = OutputTensor::new(vec![1, 5, 2], vec![0.0; 10]);
        let info = info(ModelVariant::Legacy, &["a", "b"]);
        assert!(decode(&output, &info, 0.3).is_none());
    }

    #[test]
    fn inconsistent_buffer_is_rejected() {
        let output = OutputTensor::new(vec![1, 2, 6], vec![0.0; 5]);
        let info = info(ModelVariant::EndToEnd, &["a"]);
        assert!(decode(&output, &info, 0.3).is_none());
    }
}
