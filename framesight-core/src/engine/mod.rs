//! engine — the inference-engine collaborator boundary
//!
//! The numeric pipeline never talks to ONNX Runtime directly; it hands a
//! planar input tensor to an [`InferenceEngine`] and gets a flat output buffer
//! back. The trait keeps the pipeline pure (tests drive it with a canned
//! engine) and keeps engine failures scoped to the single call that hit them.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use tracing::{debug, info};

use crate::tensor::{InputTensor, OutputTensor};

/// Custom metadata keys an exported detection model may carry.
const METADATA_KEYS: [&str; 4] = ["imgsz", "names", "description", "version"];

/// A loaded model that can be run synchronously. `run` is blocking; timeout
/// and cancellation are the engine implementation's business, not the
/// pipeline's. Errors from `run` are fatal for that call only — the caller
/// does not retry.
pub trait InferenceEngine {
    /// The model's custom key-value metadata, read once at load time.
    fn metadata(&self) -> &HashMap<String, String>;

    /// Run the model on `input` and return its first output tensor.
    fn run(&mut self, input: InputTensor) -> Result<OutputTensor>;
}

/// ONNX Runtime implementation. Built with the `load-dynamic` binding: the
/// runtime library is resolved at startup (see [`crate::runtime`]), not at
/// link time.
pub struct OrtEngine {
    session: Session,
    input_name: String,
    metadata: HashMap<String, String>,
}

impl OrtEngine {
    /// Load an ONNX model from disk and read its custom metadata.
    pub fn load<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let model_path = model_path.as_ref();
        let session = Session::builder()
            .context("failed to create session builder")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("failed to set graph optimization level")?
            .with_intra_threads(4)
            .context("failed to set intra-op thread count")?
            .commit_from_file(model_path)
            .with_context(|| format!("failed to load model from {}", model_path.display()))?;

        let input_name = session
            .inputs
            .first()
            .context("model declares no inputs")?
            .name
            .clone();

        let mut metadata = HashMap::new();
        {
            let model_metadata = session
                .metadata()
                .context("failed to read model metadata")?;
            for key in METADATA_KEYS {
                if let Some(value) = model_metadata
                    .custom(key)
                    .with_context(|| format!("failed to read metadata key {key:?}"))?
                {
                    metadata.insert(key.to_string(), value);
                }
            }
        }

        info!(
            model = %model_path.display(),
            input = %input_name,
            metadata_keys = metadata.len(),
            "ONNX session ready"
        );

        Ok(Self {
            session,
            input_name,
            metadata,
        })
    }
}

impl InferenceEngine for OrtEngine {
    fn metadata(&self) -> &HashMap<String, String> {
        &self.metadata
    }

    fn run(&mut self, input: InputTensor) -> Result<OutputTensor> {
        let shape = input.shape();
        let value = Tensor::from_array((shape, input.into_data().into_boxed_slice()))
            .context("failed to create model input tensor")?;

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => value])
            .context("model inference failed")?;

        let (_name, first) = outputs
            .iter()
            .next()
            .context("model produced no outputs")?;
        let (out_shape, data) = first
            .try_extract_tensor::<f32>()
            .context("failed to extract output tensor")?;

        let dims: Vec<usize> = (0..out_shape.len()).map(|i| out_shape[i] as usize).collect();
        debug!(shape = ?dims, "extracted output tensor");
        Ok(OutputTensor::new(dims, data.to_vec()))
    }
}
