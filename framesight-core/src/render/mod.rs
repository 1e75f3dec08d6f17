//! render — debug drawing of detection results
//!
//! Not part of the numeric pipeline; host applications that want annotated
//! output (or the bundled CLI) can stamp hollow rectangles onto the original
//! image.

use image::{Rgb, RgbImage};
use imageproc::rect::Rect;

use crate::geometry::Detection;

/// Draw one hollow rectangle per detection onto `img` in-place. Boxes are
/// clamped to the image bounds; anything that clamps away entirely is skipped.
pub fn draw_detections(img: &mut RgbImage, detections: &[Detection], color: [u8; 3]) {
    let (img_w, img_h) = (img.width() as i32, img.height() as i32);
    for det in detections {
        let x = det.x.clamp(0, img_w - 1);
        let y = det.y.clamp(0, img_h - 1);
        let w = (det.x + det.width).min(img_w) - x;
        let h = (det.y + det.height).min(img_h) - y;
        if w <= 0 || h <= 0 {
            continue;
        }
        let rect = Rect::at(x, y).of_size(w as u32, h as u32);
        imageproc::drawing::draw_hollow_rect_mut(img, rect, Rgb(color));
    }
}
