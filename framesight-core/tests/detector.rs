//! End-to-end pipeline tests driven through a canned inference engine.
//!
//! The mock engine returns a pre-built output tensor, so every stage after
//! preprocessing (decode, suppression, coordinate mapping) runs exactly as it
//! would against a real model.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use framesight_core::tensor::{InputTensor, OutputTensor};
use framesight_core::{Detector, InferenceEngine, ModelVariant, RgbFrame};

struct MockEngine {
    metadata: HashMap<String, String>,
    output: Option<OutputTensor>,
    seen_input_shapes: Arc<Mutex<Vec<[usize; 4]>>>,
}

impl MockEngine {
    fn new(metadata: &[(&str, &str)], output: Option<OutputTensor>) -> Self {
        Self {
            metadata: metadata
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            output,
            seen_input_shapes: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl InferenceEngine for MockEngine {
    fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    fn run(&mut self, input: InputTensor) -> Result<OutputTensor> {
        self.seen_input_shapes.lock().unwrap().push(input.shape());
        match &self.output {
            Some(output) => Ok(output.clone()),
            None => bail!("simulated engine failure"),
        }
    }
}

/// Solid gray frame; content is irrelevant for the canned engine.
fn frame(width: u32, height: u32) -> RgbFrame {
    RgbFrame::new(vec![128; (width * height * 3) as usize], width, height)
}

const END_TO_END_META: [(&str, &str); 4] = [
    ("imgsz", "[640, 640]"),
    ("names", "{0: 'person', 1: 'bicycle', 2: 'car'}"),
    ("description", "Ultralytics YOLO26n model"),
    ("version", "8.3.0"),
];

const LEGACY_META: [(&str, &str); 3] = [
    ("imgsz", "[640, 640]"),
    ("names", "{0: 'person', 1: 'bicycle'}"),
    ("description", "Ultralytics YOLOv8n model"),
];

#[test]
fn metadata_reaches_detector_configuration() {
    let engine = MockEngine::new(&END_TO_END_META, None);
    let detector = Detector::new(engine);
    assert_eq!(detector.input_size().width, 640);
    assert_eq!(detector.variant(), ModelVariant::EndToEnd);
    assert_eq!(detector.version(), Some("8.3.0"));
    assert_eq!(detector.label(1), Some("bicycle"));
    assert_eq!(detector.label(9), None);
}

#[test]
fn end_to_end_output_thresholds_and_maps() {
    // [1, 2, 6]: one row above threshold, one below.
    let output = OutputTensor::new(
        vec![1, 2, 6],
        vec![
            0.0, 0.0, 320.0, 320.0, 0.9, 2.0, //
            100.0, 100.0, 200.0, 200.0, 0.1, 0.0,
        ],
    );
    let engine = MockEngine::new(&END_TO_END_META, Some(output));
    let mut detector = Detector::new(engine).with_confidence_threshold(0.3);

    // Original image 1280×720, model 640×640: ratios 2.0 and 1.125.
    let detections = detector.detect(&frame(1280, 720)).unwrap();
    assert_eq!(detections.len(), 1);
    let det = &detections[0];
    assert_eq!(det.class_id, 2);
    assert_eq!(det.confidence, 0.9);
    assert_eq!((det.x, det.y, det.width, det.height), (0, 0, 640, 360));
}

#[test]
fn legacy_overlapping_same_class_keeps_higher_confidence() {
    // Two heavily overlapping class-0 candidates plus one class-1 candidate
    // at the same spot. Layout [1, 6, 3], stride 3.
    let output = OutputTensor::new(
        vec![1, 6, 3],
        vec![
            100.0, 105.0, 100.0, // cx
            100.0, 105.0, 100.0, // cy
            80.0, 80.0, 80.0, // w
            80.0, 80.0, 80.0, // h
            0.6, 0.9, 0.0, // class 0 confidence
            0.0, 0.0, 0.8, // class 1 confidence
        ],
    );
    let engine = MockEngine::new(&LEGACY_META, Some(output));
    let mut detector = Detector::new(engine)
        .with_confidence_threshold(0.3)
        .with_iou_threshold(0.45);

    let detections = detector.detect(&frame(640, 640)).unwrap();
    assert_eq!(detections.len(), 2);

    // Highest-confidence box first (suppression order), class 0 at 0.9.
    assert_eq!(detections[0].class_id, 0);
    assert_eq!(detections[0].confidence, 0.9);
    // The different-class overlap survives untouched.
    assert_eq!(detections[1].class_id, 1);
    assert_eq!(detections[1].confidence, 0.8);
    // The weaker same-class candidate is gone.
    assert!(detections.iter().all(|d| d.confidence != 0.6));
}

#[test]
fn unrecognized_shape_yields_empty_not_error() {
    // Legacy model, but the tensor only carries 5 rows for 2 classes.
    let output = OutputTensor::new(vec![1, 5, 2], vec![0.0; 10]);
    let engine = MockEngine::new(&LEGACY_META, Some(output));
    let mut detector = Detector::new(engine);
    let detections = detector.detect(&frame(640, 640)).unwrap();
    assert!(detections.is_empty());
}

#[test]
fn engine_failure_propagates_as_error() {
    let engine = MockEngine::new(&LEGACY_META, None);
    let mut detector = Detector::new(engine);
    assert!(detector.detect(&frame(640, 640)).is_err());
}

#[test]
fn preprocessed_input_has_model_shape() {
    let output = OutputTensor::new(vec![1, 1, 6], vec![0.0; 6]);
    let engine = MockEngine::new(&END_TO_END_META, Some(output));
    let shapes = Arc::clone(&engine.seen_input_shapes);
    let mut detector = Detector::new(engine);

    // Arbitrary-size input gets stretched to the 640×640 model size.
    detector.detect(&frame(123, 77)).unwrap();
    assert_eq!(shapes.lock().unwrap().as_slice(), &[[1, 3, 640, 640]]);
}

#[test]
fn output_boxes_have_positive_extent() {
    // Sub-pixel-wide candidate flattens to zero width after truncation and
    // must not reach the caller.
    let output = OutputTensor::new(
        vec![1, 2, 6],
        vec![
            10.0, 10.0, 10.4, 300.0, 0.9, 0.0, //
            20.0, 20.0, 120.0, 220.0, 0.9, 1.0,
        ],
    );
    let engine = MockEngine::new(&END_TO_END_META, Some(output));
    let mut detector = Detector::new(engine);
    let detections = detector.detect(&frame(640, 640)).unwrap();
    assert_eq!(detections.len(), 1);
    assert!(detections[0].width > 0 && detections[0].height > 0);
    assert_eq!(detections[0].class_id, 1);
}
