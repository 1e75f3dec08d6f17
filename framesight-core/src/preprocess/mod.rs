//! preprocess — arbitrary-size RGB image → normalized planar input tensor
//!
//! Two steps: a non-aspect-preserving stretch to the model input size, then a
//! byte → f32 normalization that de-interleaves the packed RGB rows into three
//! contiguous channel planes (the engine's input contract is channel-major).
//!
//! The stretch is deliberate: each axis is scaled independently, aspect ratio
//! is NOT preserved, and there is no letterbox padding. The coordinate mapper
//! inverts exactly this transform, so "improving" the resize here would skew
//! every reported box.

use anyhow::{Context, Result};
use fast_image_resize as fr;
use image::RgbImage;
use rayon::prelude::*;

use crate::coords::ImageSize;
use crate::tensor::InputTensor;

/// A decoded image in packed RGB24, row-major, with no scan-line padding.
#[derive(Debug, Clone)]
pub struct RgbFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl RgbFrame {
    /// Take ownership of an already-tight RGB buffer.
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(data.len(), (width * height * 3) as usize);
        Self {
            data,
            width,
            height,
        }
    }

    pub fn from_image(img: &RgbImage) -> Self {
        Self::new(img.as_raw().clone(), img.width(), img.height())
    }

    /// Compact a buffer whose rows are padded to `stride` bytes (as bitmap
    /// APIs and video decoders commonly produce) into tight RGB24 rows.
    pub fn from_raw_with_stride(raw: &[u8], width: u32, height: u32, stride: usize) -> Self {
        let row_bytes = width as usize * 3;
        let mut data = Vec::with_capacity(row_bytes * height as usize);
        for row in 0..height as usize {
            let start = row * stride;
            data.extend_from_slice(&raw[start..start + row_bytes]);
        }
        Self::new(data, width, height)
    }
}

/// Converts frames into model input tensors. Owns a reusable resizer and
/// scratch buffer so repeated calls do not reallocate.
pub struct Preprocessor {
    model: ImageSize,
    resizer: fr::Resizer,
    resize_buf: Vec<u8>,
}

impl Preprocessor {
    pub fn new(model: ImageSize) -> Self {
        Self {
            model,
            resizer: fr::Resizer::new(),
            resize_buf: vec![0u8; (model.width * model.height * 3) as usize],
        }
    }

    pub fn model_size(&self) -> ImageSize {
        self.model
    }

    /// Produce the `[1, 3, H_m, W_m]` normalized planar tensor for `frame`.
    /// The source frame is not modified.
    pub fn run(&mut self, frame: &RgbFrame) -> Result<InputTensor> {
        let (w, h) = (self.model.width as usize, self.model.height as usize);

        // Already model-sized frames skip the resampler entirely.
        if frame.width == self.model.width && frame.height == self.model.height {
            let data = normalize_planar(&frame.data, w, h);
            return Ok(InputTensor::new(data, w, h));
        }

        let src = fr::images::ImageRef::new(frame.width, frame.height, &frame.data, fr::PixelType::U8x3)
            .context("failed to create resize source view")?;

        let mut dst = fr::images::Image::from_vec_u8(
            self.model.width,
            self.model.height,
            std::mem::take(&mut self.resize_buf),
            fr::PixelType::U8x3,
        )
        .context("failed to create resize destination")?;

        let options = fr::ResizeOptions::new()
            .resize_alg(fr::ResizeAlg::Convolution(fr::FilterType::Bilinear));
        self.resizer
            .resize(&src, &mut dst, Some(&options))
            .context("stretch resize to model input size failed")?;

        self.resize_buf = dst.into_vec();
        let data = normalize_planar(&self.resize_buf, w, h);
        Ok(InputTensor::new(data, w, h))
    }
}

/// De-interleave packed RGB bytes into three normalized f32 planes at offsets
/// 0, `w·h` and `2·w·h`.
///
/// The three planes are disjoint output regions, so they are filled in
/// parallel with no synchronization; every element depends only on its own
/// source byte and the result is bit-identical to a sequential loop.
fn normalize_planar(raw: &[u8], w: usize, h: usize) -> Vec<f32> {
    let size = w * h;
    debug_assert_eq!(raw.len(), size * 3);
    let mut data = vec![0f32; 3 * size];

    let (r_plane, gb_planes) = data.split_at_mut(size);
    let (g_plane, b_plane) = gb_planes.split_at_mut(size);
    rayon::join(
        || {
            r_plane
                .par_iter_mut()
                .enumerate()
                .for_each(|(idx, out)| *out = raw[idx * 3] as f32 / 255.0)
        },
        || {
            rayon::join(
                || {
                    g_plane
                        .par_iter_mut()
                        .enumerate()
                        .for_each(|(idx, out)| *out = raw[idx * 3 + 1] as f32 / 255.0)
                },
                || {
                    b_plane
                        .par_iter_mut()
                        .enumerate()
                        .for_each(|(idx, out)| *out = raw[idx * 3 + 2] as f32 / 255.0)
                },
            )
        },
    );

    data
}
