pub mod coords;
pub mod decode;
pub mod detector;
pub mod engine;
pub mod geometry;
pub mod metadata;
pub mod nms;
pub mod preprocess;
pub mod render;
pub mod runtime;
pub mod tensor;

// Re-export the types a host application touches on the happy path.
pub use coords::ImageSize;
pub use detector::Detector;
pub use engine::{InferenceEngine, OrtEngine};
pub use geometry::Detection;
pub use metadata::ModelVariant;
pub use preprocess::RgbFrame;

pub use anyhow::Error;
pub use anyhow::Result;
