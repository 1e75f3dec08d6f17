//! detector — the per-call pipeline orchestrator
//!
//! Sequences preprocess → inference → decode → (legacy only) suppression →
//! coordinate mapping. Holds nothing but the engine and read-only
//! configuration, so a `detect` call has no effect on the next one.

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::coords::{map_to_image, ImageSize};
use crate::decode::decode;
use crate::engine::InferenceEngine;
use crate::geometry::Detection;
use crate::metadata::{ModelInfo, ModelVariant};
use crate::nms::suppress;
use crate::preprocess::{Preprocessor, RgbFrame};

/// Default confidence threshold: candidates must score strictly above it.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.3;
/// Default IoU threshold for per-class suppression.
pub const DEFAULT_IOU_THRESHOLD: f32 = 0.45;

/// Pixels in, boxes out. Generic over the engine so tests (and alternative
/// runtimes) can slot in their own implementation.
pub struct Detector<E> {
    engine: E,
    info: ModelInfo,
    preprocessor: Preprocessor,
    confidence_threshold: f32,
    iou_threshold: f32,
}

impl<E: InferenceEngine> Detector<E> {
    /// Take ownership of a loaded engine and parse its model metadata. The
    /// parsed configuration is immutable for the detector's lifetime; the
    /// engine resource is released when the detector is dropped.
    pub fn new(engine: E) -> Self {
        let info = ModelInfo::from_metadata(engine.metadata());
        let preprocessor = Preprocessor::new(info.input_size);
        Self {
            engine,
            info,
            preprocessor,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            iou_threshold: DEFAULT_IOU_THRESHOLD,
        }
    }

    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn with_iou_threshold(mut self, threshold: f32) -> Self {
        self.iou_threshold = threshold;
        self
    }

    pub fn input_size(&self) -> ImageSize {
        self.info.input_size
    }

    pub fn variant(&self) -> ModelVariant {
        self.info.variant
    }

    pub fn version(&self) -> Option<&str> {
        self.info.version.as_deref()
    }

    pub fn names(&self) -> &std::collections::HashMap<usize, String> {
        &self.info.names
    }

    pub fn label(&self, class_id: usize) -> Option<&str> {
        self.info.names.get(&class_id).map(String::as_str)
    }

    /// Detect objects in `frame` and return calibrated boxes in the frame's
    /// own pixel coordinates.
    ///
    /// An unrecognized output tensor shape is a per-call, non-fatal condition
    /// and yields an empty list; an engine failure is an error for this call
    /// only and is returned as-is.
    pub fn detect(&mut self, frame: &RgbFrame) -> Result<Vec<Detection>> {
        let original = ImageSize::new(frame.width, frame.height);

        let input = self.preprocessor.run(frame)?;
        let output = self
            .engine
            .run(input)
            .context("inference engine failed")?;

        let Some(candidates) = decode(&output, &self.info, self.confidence_threshold) else {
            warn!(shape = ?output.shape, "unrecognized output tensor shape; reporting no detections");
            return Ok(Vec::new());
        };

        // The end-to-end layout is suppressed inside the graph already.
        let kept = match self.info.variant {
            ModelVariant::Legacy => suppress(candidates, self.iou_threshold),
            ModelVariant::EndToEnd => candidates,
        };

        let mut detections = Vec::with_capacity(kept.len());
        for raw in kept {
            let (x, y, width, height) = map_to_image(raw.bounds, original, self.info.input_size);
            // Truncation can flatten sub-pixel boxes; those are not detections.
            if width <= 0 || height <= 0 {
                continue;
            }
            detections.push(Detection {
                class_id: raw.class_id,
                confidence: raw.confidence,
                x,
                y,
                width,
                height,
            });
        }

        debug!(count = detections.len(), "detection complete");
        Ok(detections)
    }
}
