//! geometry — rectangles and detection value types
//!
//! Everything here is a plain value type; the only behavior is axis-aligned
//! intersection and IoU, which the suppressor builds on.

/// Axis-aligned rectangle in corner form (top-left + extent), f32.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Corner form from two corner points (x1, y1)-(x2, y2).
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self::new(x1, y1, x2 - x1, y2 - y1)
    }

    /// Center form (cx, cy, w, h) converted to corner form.
    pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self::new(cx - width / 2.0, cy - height / 2.0, width, height)
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Intersection rectangle, clamped to non-negative extents.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);
        Rect::new(x1, y1, (x2 - x1).max(0.0), (y2 - y1).max(0.0))
    }

    /// IoU (intersection over union) with another rectangle.
    ///
    /// A rectangle with non-positive area never overlaps anything: the result
    /// is defined as 0.0 so degenerate boxes neither suppress nor get
    /// suppressed through divide-by-zero artifacts.
    pub fn iou(&self, other: &Rect) -> f32 {
        let area_a = self.area();
        if area_a <= 0.0 {
            return 0.0;
        }
        let area_b = other.area();
        if area_b <= 0.0 {
            return 0.0;
        }
        let inter = self.intersect(other).area();
        inter / (area_a + area_b - inter)
    }
}

/// Pre-suppression detection hypothesis, in model input space.
#[derive(Debug, Clone, Copy)]
pub struct RawDetection {
    /// Source slot index in the raw output (bookkeeping only; two candidates
    /// from the same slot share it).
    pub position: usize,
    pub class_id: usize,
    pub confidence: f32,
    pub bounds: Rect,
}

/// Final detection in original-image pixel coordinates.
///
/// Width and height are always positive; zero-area candidates are dropped
/// before they reach the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub class_id: usize,
    pub confidence: f32,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}
