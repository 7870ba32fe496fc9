//! Single-image prediction
//!
//! [`ClassifierContext`] bundles everything a prediction needs (network,
//! transform, device, label map). It is built once and passed by reference;
//! there is no process-wide model state.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use burn::prelude::*;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::ImageTransform;
use crate::model::{load_checkpoint, LabelMap, ResNet18};
use crate::utils::error::{ClassifierError, Result};

/// Index of the largest value; the lowest index wins ties and NaNs never win
pub fn argmax(values: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &value) in values.iter().enumerate() {
        if value.is_nan() {
            continue;
        }
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((idx, value)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// Numerically stable softmax
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Result of a single prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub image_path: Option<PathBuf>,
    pub class_index: usize,
    pub class_name: String,
    /// Softmax probability of the predicted class
    pub confidence: f32,
    pub probabilities: Vec<f32>,
    pub inference_time_ms: f64,
}

impl Prediction {
    /// Build from raw logits, resolving the winning index through `labels`
    pub fn from_logits(
        logits: &[f32],
        labels: &LabelMap,
        inference_time: Duration,
        image_path: Option<PathBuf>,
    ) -> Result<Self> {
        let class_index = argmax(logits)
            .ok_or_else(|| ClassifierError::Inference("Model produced no usable logits".into()))?;
        let class_name = labels.name(class_index)?.to_string();
        let probabilities = softmax(logits);

        Ok(Self {
            image_path,
            class_index,
            class_name,
            confidence: probabilities[class_index],
            probabilities,
            inference_time_ms: inference_time.as_secs_f64() * 1000.0,
        })
    }
}

/// Model + preprocessing + device + label map
#[derive(Debug)]
pub struct ClassifierContext<B: Backend> {
    model: ResNet18<B>,
    transform: ImageTransform,
    labels: LabelMap,
    device: B::Device,
}

impl<B: Backend> ClassifierContext<B> {
    /// Assemble a context from parts; the head must match the label map
    pub fn new(
        model: ResNet18<B>,
        labels: LabelMap,
        transform: ImageTransform,
        device: B::Device,
    ) -> Result<Self> {
        if model.num_classes() != labels.len() {
            return Err(ClassifierError::ClassCountMismatch {
                expected: labels.len(),
                found: model.num_classes(),
            });
        }

        Ok(Self {
            model,
            transform,
            labels,
            device,
        })
    }

    /// Restore a trained checkpoint whose head is `expected_classes` wide
    pub fn load(checkpoint: &Path, expected_classes: usize, device: &B::Device) -> Result<Self> {
        let loaded = load_checkpoint::<B>(checkpoint, expected_classes, device)?;
        let transform = loaded
            .metadata
            .map(|m| m.transform)
            .unwrap_or_default();

        Self::new(loaded.model, loaded.labels, transform, device.clone())
    }

    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    pub fn transform(&self) -> &ImageTransform {
        &self.transform
    }

    /// Read, preprocess and classify one image file
    pub fn predict_path(&self, path: &Path) -> Result<Prediction> {
        let rgb = self.transform.load(path)?;
        self.predict_rgb(&rgb, Some(path.to_path_buf()))
    }

    fn predict_rgb(&self, rgb: &RgbImage, image_path: Option<PathBuf>) -> Result<Prediction> {
        let start = Instant::now();
        let input = self.transform.to_batch::<B>(rgb, &self.device);
        let logits: Vec<f32> = self
            .model
            .forward(input)
            .into_data()
            .convert::<f32>()
            .to_vec()
            .map_err(|e| ClassifierError::Inference(format!("Failed to read logits: {:?}", e)))?;

        let prediction = Prediction::from_logits(&logits, &self.labels, start.elapsed(), image_path)?;
        debug!(
            "Predicted '{}' ({:.1}%) in {:.1}ms",
            prediction.class_name,
            prediction.confidence * 100.0,
            prediction.inference_time_ms
        );
        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DefaultBackend;
    use image::{ImageBuffer, Rgb};

    type TestBackend = DefaultBackend;

    fn test_context() -> ClassifierContext<TestBackend> {
        let device = Default::default();
        let model = ResNet18::<TestBackend>::new(6, &device);
        ClassifierContext::new(model, LabelMap::default(), ImageTransform::new(32), device).unwrap()
    }

    #[test]
    fn test_argmax_ties_go_to_lowest_index() {
        assert_eq!(argmax(&[0.1, 0.7, 0.7, 0.2]), Some(1));
        assert_eq!(argmax(&[1.0, 1.0]), Some(0));
        assert_eq!(argmax(&[f32::NAN, 0.5]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0]);
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }

    #[test]
    fn test_prediction_rejects_index_outside_label_map() {
        let labels = LabelMap::new(vec!["cat".into(), "dog".into()]);
        let err = Prediction::from_logits(&[0.0, 0.1, 5.0], &labels, Duration::ZERO, None)
            .unwrap_err();
        assert!(matches!(err, ClassifierError::UnknownClassIndex(2)));
    }

    #[test]
    fn test_context_rejects_mismatched_labels() {
        let device = Default::default();
        let model = ResNet18::<TestBackend>::new(6, &device);
        let labels = LabelMap::new(vec!["cat".into(), "dog".into()]);

        let err = ClassifierContext::new(model, labels, ImageTransform::new(32), device).unwrap_err();
        assert!(matches!(err, ClassifierError::ClassCountMismatch { .. }));
    }

    #[test]
    fn test_prediction_is_idempotent() {
        let context = test_context();
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("sample.png");
        ImageBuffer::from_fn(48, 40, |x, y| Rgb([(x * 5) as u8, (y * 6) as u8, 77u8]))
            .save(&path)
            .unwrap();

        let first = context.predict_path(&path).unwrap();
        let second = context.predict_path(&path).unwrap();

        assert_eq!(first.class_index, second.class_index);
        assert_eq!(first.class_name, second.class_name);
        assert!(first.class_index < 6);
        assert!((first.probabilities.iter().sum::<f32>() - 1.0).abs() < 1e-4);
    }
}
