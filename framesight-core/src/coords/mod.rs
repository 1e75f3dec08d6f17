//! coords — model space ↔ original image space
//!
//! The preprocessor stretches the source image independently on each axis to
//! the model input size, so the inverse transform is an independent per-axis
//! linear scale with the same ratios. Keep the two in lock-step: a box decoded
//! in model space must land exactly on the stretched-then-unstretched original.

use crate::geometry::Rect;

/// Immutable width/height pair. Used both for the model input size (parsed
/// from metadata) and for original image dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Map a model-space rectangle back to integer pixel coordinates in the
/// original image. Each component is scaled by the per-axis ratio and then
/// truncated (not rounded), matching the forward stretch.
pub fn map_to_image(rect: Rect, original: ImageSize, model: ImageSize) -> (i32, i32, i32, i32) {
    let x_ratio = original.width as f32 / model.width as f32;
    let y_ratio = original.height as f32 / model.height as f32;
    (
        (rect.x * x_ratio) as i32,
        (rect.y * y_ratio) as i32,
        (rect.width * x_ratio) as i32,
        (rect.height * y_ratio) as i32,
    )
}
