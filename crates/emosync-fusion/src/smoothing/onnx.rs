//! ONNX Runtime sequence classifier.
//!
//! Runs an exported sequence model taking a `[N, K, 7]` float input and
//! producing `[N, 7]` class probabilities. Only the CPU execution provider
//! is used; the model is small and inputs are batched per video.

use std::path::Path;
use std::sync::Mutex;

use emosync_models::EmotionLabel;
use ndarray::Array3;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, Value};
use tracing::info;

use super::sequence::SequenceClassifier;
use crate::error::{FusionError, FusionResult};

pub struct OrtSequenceClassifier {
    session: Mutex<Session>,
    output_name: String,
}

impl OrtSequenceClassifier {
    /// Load the model from disk.
    ///
    /// Returns `ModelNotFound` if the file doesn't exist.
    pub fn load(model_path: &Path, output_name: impl Into<String>) -> FusionResult<Self> {
        if !model_path.exists() {
            return Err(FusionError::ModelNotFound(model_path.to_path_buf()));
        }

        let model_bytes = std::fs::read(model_path)?;

        let session = Session::builder()
            .map_err(|e| {
                FusionError::inference_failed(format!("Failed to create session builder: {}", e))
            })?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| {
                FusionError::inference_failed(format!("Failed to set optimization level: {}", e))
            })?
            .commit_from_memory(&model_bytes)
            .map_err(|e| FusionError::inference_failed(format!("Failed to load ONNX model: {}", e)))?;

        info!(model_path = %model_path.display(), "Sequence model loaded");

        Ok(Self {
            session: Mutex::new(session),
            output_name: output_name.into(),
        })
    }
}

impl SequenceClassifier for OrtSequenceClassifier {
    fn predict(&self, windows: &Array3<f32>) -> FusionResult<Vec<[f32; EmotionLabel::COUNT]>> {
        let (n, k, c) = windows.dim();
        let data: Vec<f32> = windows.iter().copied().collect();

        let input: ort::value::DynValue = Tensor::from_array((vec![n, k, c], data.into_boxed_slice()))
            .map(Value::from)
            .map_err(|e| FusionError::inference_failed(format!("Failed to create tensor: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| FusionError::inference_failed("Session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![input])
            .map_err(|e| FusionError::inference_failed(format!("ONNX inference failed: {}", e)))?;

        let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
            FusionError::inference_failed(format!("Missing {} tensor", self.output_name))
        })?;

        let (_, probabilities) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| FusionError::inference_failed(format!("Failed to extract tensor: {}", e)))?;

        if probabilities.len() != n * EmotionLabel::COUNT {
            return Err(FusionError::inference_failed(format!(
                "Unexpected output size: expected {}, got {}",
                n * EmotionLabel::COUNT,
                probabilities.len()
            )));
        }

        Ok(probabilities
            .chunks_exact(EmotionLabel::COUNT)
            .map(|row| {
                let mut dist = [0.0f32; EmotionLabel::COUNT];
                dist.copy_from_slice(row);
                dist
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "onnx_sequence"
    }
}
