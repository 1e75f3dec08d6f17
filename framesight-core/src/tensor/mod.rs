//! tensor — flat numeric buffers exchanged with the inference engine
//!
//! Both tensor types are deliberately plain `Vec<f32>` buffers with explicit
//! offset arithmetic. The input side is always `[1, 3, H, W]` (channel-planar);
//! the output side carries whatever shape the model declares, and the decoder
//! validates it per layout.

/// Normalized model input: a dense `[1, 3, height, width]` f32 buffer in
/// channel-planar order. Plane offsets are `0`, `H·W` and `2·H·W`.
#[derive(Debug, Clone)]
pub struct InputTensor {
    data: Vec<f32>,
    width: usize,
    height: usize,
}

impl InputTensor {
    /// Wrap an already-planar buffer. `data.len()` must be `3 * width * height`.
    pub fn new(data: Vec<f32>, width: usize, height: usize) -> Self {
        debug_assert_eq!(data.len(), 3 * width * height);
        Self {
            data,
            width,
            height,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Logical shape, batch-major: `[1, 3, height, width]`.
    pub fn shape(&self) -> [usize; 4] {
        [1, 3, self.height, self.width]
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// One channel plane, row-major. `channel` is 0 (R), 1 (G) or 2 (B).
    pub fn plane(&self, channel: usize) -> &[f32] {
        let size = self.width * self.height;
        &self.data[channel * size..(channel + 1) * size]
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }
}

/// Raw model output: a flat f32 buffer plus the shape descriptor reported by
/// the engine. Interpretation is entirely up to the decoder.
#[derive(Debug, Clone)]
pub struct OutputTensor {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl OutputTensor {
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Self {
        Self { shape, data }
    }

    /// Number of elements the declared shape implies.
    pub fn element_count(&self) -> usize {
        self.shape.iter().product()
    }

    /// True when the buffer length matches the declared shape.
    pub fn is_consistent(&self) -> bool {
        self.data.len() == self.element_count()
    }
}
