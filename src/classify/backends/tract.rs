#![cfg(feature = "backend-tract")]

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tract_onnx::prelude::*;

use crate::classify::classifier::{Category, Classifier};
use crate::classify::result::Classification;
use crate::frame::Rotation;
use crate::preprocess::PreparedImage;

/// Tract-based classifier for ONNX inference.
///
/// Loads a per-category model and label file from a local model directory
/// and performs inference on prepared RGB images. It does not perform any
/// network I/O or write to disk beyond model loading.
pub struct TractClassifier {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>, TypedModel>,
    labels: Vec<String>,
    category: Category,
    input_size: u32,
    confidence_threshold: f32,
    max_results: usize,
}

impl TractClassifier {
    /// Load `<category>.onnx` and `<category>_labels.txt` from `model_dir`
    /// and prepare the model for inference at the given input size.
    pub fn new<P: AsRef<Path>>(model_dir: P, category: Category, input_size: u32) -> Result<Self> {
        let model_dir = model_dir.as_ref();
        let model_path = model_dir.join(format!("{category}.onnx"));
        let labels_path = model_dir.join(format!("{category}_labels.txt"));

        let model = tract_onnx::onnx()
            .model_for_path(&model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(
                    f32::datum_type(),
                    tvec!(1, 3, input_size as usize, input_size as usize),
                ),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        let labels = fs::read_to_string(&labels_path)
            .with_context(|| format!("failed to read labels from {}", labels_path.display()))?
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect();

        Ok(Self {
            model,
            labels,
            category,
            input_size,
            confidence_threshold: 0.1,
            max_results: 3,
        })
    }

    /// Override the default confidence threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Override the default result count cap.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    fn build_input(&self, image: &PreparedImage) -> Result<Tensor> {
        if image.size() != self.input_size {
            return Err(anyhow!(
                "prepared image size {} does not match model input {}",
                image.size(),
                self.input_size
            ));
        }

        let side = image.size() as usize;
        let pixels = image.pixels();
        let input =
            tract_ndarray::Array4::from_shape_fn((1, 3, side, side), |(_, channel, y, x)| {
                let idx = (y * side + x) * 3 + channel;
                pixels[idx] as f32 / 255.0
            });

        Ok(input.into_tensor())
    }

    fn extract_results(&self, outputs: TVec<TValue>) -> Result<Vec<Classification>> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let scores = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;

        let mut results: Vec<Classification> = scores
            .iter()
            .zip(self.labels.iter())
            .filter(|(score, _)| **score >= self.confidence_threshold)
            .map(|(score, label)| Classification::new(label.clone(), *score))
            .collect();

        results.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(self.max_results);

        Ok(results)
    }
}

impl Classifier for TractClassifier {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn category(&self) -> Category {
        self.category
    }

    fn classify(
        &mut self,
        image: &PreparedImage,
        _rotation: Rotation,
    ) -> Result<Vec<Classification>> {
        let input = self.build_input(image)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        self.extract_results(outputs)
    }
}
