//! metadata — loosely-structured model metadata parsing
//!
//! Ultralytics-exported ONNX models carry their configuration as custom
//! key-value strings: `imgsz` is a bracketed `[height, width]` pair, `names`
//! is a Python-dict-style mapping, `description` identifies the model family.
//! Malformed values are an expected, recoverable condition — every parser here
//! degrades to a default instead of failing, and the model still runs.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::coords::ImageSize;

/// Input size assumed when `imgsz` metadata is missing or unparseable.
pub const DEFAULT_INPUT_SIZE: ImageSize = ImageSize {
    width: 640,
    height: 640,
};
/// `description` substring that marks a fixed-count, suppression-free output.
const END_TO_END_MARKER: &str = "YOLO26";

/// Which raw output layout the loaded model produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelVariant {
    /// `[1, 4+C, M]` channel-major candidate grid; every position scores every
    /// class, so the decoder output still needs non-maximum suppression.
    Legacy,
    /// `[1, N, 6]` one row per final detection (x1, y1, x2, y2, score, class);
    /// suppression already happened inside the graph.
    EndToEnd,
}

impl ModelVariant {
    /// Select the layout from the model's `description` metadata. Presence of
    /// the end-to-end marker substring selects [`ModelVariant::EndToEnd`];
    /// absence (or a missing key) selects [`ModelVariant::Legacy`].
    pub fn from_description(description: Option<&str>) -> Self {
        match description {
            Some(text) if text.contains(END_TO_END_MARKER) => ModelVariant::EndToEnd,
            _ => ModelVariant::Legacy,
        }
    }
}

/// Parse an `imgsz` value such as `"[640, 640]"`.
///
/// The first number is the HEIGHT and the second the WIDTH — this order comes
/// from the exporter and must be preserved: `"[1280, 720]"` is a 720-wide,
/// 1280-tall input.
pub fn parse_size(text: &str) -> Option<ImageSize> {
    let inner = text.trim().strip_prefix('[')?.strip_suffix(']')?;
    let (first, second) = inner.split_once(',')?;
    let height: u32 = first.trim().parse().ok()?;
    let width: u32 = second.trim().parse().ok()?;
    Some(ImageSize::new(width, height))
}

/// Parse a `names` value such as `"{0: 'person', 1: 'bicycle'}"` into an
/// index → label map. Entries that fail to parse are skipped individually;
/// a fully malformed string yields an empty map.
pub fn parse_names(text: &str) -> HashMap<usize, String> {
    let inner = text
        .trim()
        .trim_start_matches('{')
        .trim_end_matches('}');

    let mut names = HashMap::new();
    for entry in inner.split(", ") {
        let Some((index, label)) = entry.split_once(':') else {
            continue;
        };
        let Ok(index) = index.trim().parse::<usize>() else {
            continue;
        };
        let label = label.trim().trim_matches('\'');
        names.insert(index, label.to_string());
    }
    names
}

/// Everything the detector needs to know about a loaded model. Parsed once
/// from the engine's metadata map and immutable afterwards.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub input_size: ImageSize,
    pub names: HashMap<usize, String>,
    pub variant: ModelVariant,
    pub version: Option<String>,
}

impl ModelInfo {
    /// Build from the raw custom metadata key-value map.
    pub fn from_metadata(metadata: &HashMap<String, String>) -> Self {
        let input_size = match metadata.get("imgsz").map(|v| parse_size(v)) {
            Some(Some(size)) => size,
            Some(None) => {
                warn!("unparseable imgsz metadata; assuming 640x640");
                DEFAULT_INPUT_SIZE
            }
            None => DEFAULT_INPUT_SIZE,
        };

        let names = metadata
            .get("names")
            .map(|v| parse_names(v))
            .unwrap_or_default();

        let variant = ModelVariant::from_description(metadata.get("description").map(String::as_str));
        let version = metadata.get("version").cloned();

        debug!(
            width = input_size.width,
            height = input_size.height,
            classes = names.len(),
            ?variant,
            "parsed model metadata"
        );

        Self {
            input_size,
            names,
            variant,
            version,
        }
    }

    pub fn num_classes(&self) -> usize {
        self.names.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_size_square() {
        assert_eq!(parse_size("[640, 640]"), Some(ImageSize::new(640, 640)));
        assert_eq!(parse_size("[416, 416]"), Some(ImageSize::new(416, 416)));
    }

    #[test]
    fn parse_size_height_comes_first() {
        // [1280, 720] means 1280 tall, 720 wide.
        assert_eq!(parse_size("[1280, 720]"), Some(ImageSize::new(720, 1280)));
    }

    #[test]
    fn parse_size_rejects_garbage() {
        assert_eq!(parse_size("1280, 720"), None);
        assert_eq!(parse_size("[]"), None);
        assert_eq!(parse_size("[a, b]"), None);
    }

    #[test]
    fn parse_names_multiple_entries() {
        let names = parse_names("{0: 'person', 1: 'bicycle', 2: 'car'}");
        assert_eq!(names.len(), 3);
        assert_eq!(names[&0], "person");
        assert_eq!(names[&1], "bicycle");
        assert_eq!(names[&2], "car");
    }

    #[test]
    fn parse_names_single_entry() {
        let names = parse_names("{0: 'person'}");
        assert_eq!(names.len(), 1);
        assert_eq!(names[&0], "person");
    }

    #[test]
    fn parse_names_skips_bad_entries() {
        let names = parse_names("{0: 'person', oops, 2: 'car'}");
        assert_eq!(names.len(), 2);
        assert_eq!(names[&0], "person");
        assert_eq!(names[&2], "car");
    }

    #[test]
    fn variant_from_description() {
        assert_eq!(
            ModelVariant::from_description(Some("Ultralytics YOLO26n model")),
            ModelVariant::EndToEnd
        );
        assert_eq!(
            ModelVariant::from_description(Some("Ultralytics YOLOv8n model")),
            ModelVariant::Legacy
        );
        assert_eq!(ModelVariant::from_description(None), ModelVariant::Legacy);
    }

    #[test]
    fn model_info_degrades_silently() {
        let metadata = HashMap::from([("imgsz".to_string(), "banana".to_string())]);
        let info = ModelInfo::from_metadata(&metadata);
        assert_eq!(info.input_size, DEFAULT_INPUT_SIZE);
        assert!(info.names.is_empty());
        assert_eq!(info.variant, ModelVariant::Legacy);
        assert_eq!(info.version, None);
    }
}
