//! Configuration for training and filtering
//!
//! Both configs deserialize from TOML with every field optional; missing
//! fields take the defaults below. The CLI applies its flags on top.

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::dataset::AugmentationConfig;
use crate::model::CheckpointPaths;
use crate::utils::error::{ClassifierError, Result};
use crate::{IMAGE_SIZE, NUM_CLASSES};

/// Default checkpoint base name (without extension)
pub const DEFAULT_CHECKPOINT_NAME: &str = "cat_classifier";

/// Where `train` looks for torchvision's `resnet18` ImageNet weights
pub const DEFAULT_PRETRAINED_WEIGHTS: &str = "weights/resnet18.pth";

/// Read a TOML file into any deserializable config
pub fn load_toml_config<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned,
{
    let content = fs::read_to_string(path).map_err(|e| {
        ClassifierError::Config(format!("Failed to read config {}: {e}", path.display()))
    })?;

    toml::from_str(&content).map_err(|e| {
        ClassifierError::Config(format!("Failed to parse config {}: {e}", path.display()))
    })
}

/// Trainer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Dataset root containing `train/` and `test/`
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub checkpoint_name: String,
    /// torchvision `resnet18` state dict (`.pth` or `.safetensors`)
    pub pretrained_weights: Option<PathBuf>,
    /// Train from random initialisation and ignore `pretrained_weights`
    pub from_scratch: bool,
    pub num_classes: usize,
    pub image_size: u32,
    pub batch_size: usize,
    pub num_epochs: usize,
    pub learning_rate: f64,
    pub seed: u64,
    pub augmentation: AugmentationConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("dataset"),
            output_dir: PathBuf::from("output"),
            checkpoint_name: DEFAULT_CHECKPOINT_NAME.to_string(),
            pretrained_weights: Some(PathBuf::from(DEFAULT_PRETRAINED_WEIGHTS)),
            from_scratch: false,
            num_classes: NUM_CLASSES,
            image_size: IMAGE_SIZE as u32,
            batch_size: 32,
            num_epochs: 15,
            learning_rate: 1e-3,
            seed: 42,
            augmentation: AugmentationConfig::default(),
        }
    }
}

impl TrainingConfig {
    pub fn load(path: &Path) -> Result<Self> {
        load_toml_config(path)
    }

    pub fn train_dir(&self) -> PathBuf {
        self.data_dir.join("train")
    }

    pub fn test_dir(&self) -> PathBuf {
        self.data_dir.join("test")
    }

    pub fn checkpoint_paths(&self) -> CheckpointPaths {
        CheckpointPaths::in_dir(&self.output_dir, &self.checkpoint_name)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_classes == 0 {
            return Err(ClassifierError::Config("num_classes must be positive".into()));
        }
        if self.batch_size == 0 {
            return Err(ClassifierError::Config("batch_size must be positive".into()));
        }
        if self.num_epochs == 0 {
            return Err(ClassifierError::Config("num_epochs must be positive".into()));
        }
        if self.image_size < 32 {
            return Err(ClassifierError::Config(format!(
                "image_size {} is too small for ResNet-18 (minimum 32)",
                self.image_size
            )));
        }
        if self.learning_rate.is_nan() || self.learning_rate <= 0.0 {
            return Err(ClassifierError::Config("learning_rate must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.augmentation.horizontal_flip_prob) {
            return Err(ClassifierError::Config(
                "horizontal_flip_prob must be within [0, 1]".into(),
            ));
        }
        if self.augmentation.rotation_degrees < 0.0 {
            return Err(ClassifierError::Config("rotation_degrees must be >= 0".into()));
        }
        if self.checkpoint_name.is_empty() || self.checkpoint_name.contains('.') {
            return Err(ClassifierError::Config(
                "checkpoint_name must be non-empty and contain no '.'".into(),
            ));
        }
        if self.pretrained_weights.is_none() && !self.from_scratch {
            return Err(ClassifierError::Config(
                "ImageNet weights required: set pretrained_weights (--pretrained) \
                 or from_scratch (--from-scratch)"
                    .into(),
            ));
        }
        Ok(())
    }
}

/// Filter utility settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Checkpoint base path (extension optional)
    pub checkpoint: PathBuf,
    /// Class reported as a match
    pub target_class: String,
    /// Required head width
    pub num_classes: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            checkpoint: PathBuf::from("output").join(DEFAULT_CHECKPOINT_NAME),
            target_class: "cat".to_string(),
            num_classes: NUM_CLASSES,
        }
    }
}

impl FilterConfig {
    pub fn load(path: &Path) -> Result<Self> {
        load_toml_config(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_training_defaults() {
        let config = TrainingConfig::default();

        assert_eq!(config.num_classes, 6);
        assert_eq!(config.image_size, 224);
        assert_eq!(config.batch_size, 32);
        assert_eq!(config.num_epochs, 15);
        assert_eq!(config.learning_rate, 0.001);
        assert!(config.validate().is_ok());
        assert_eq!(config.train_dir(), PathBuf::from("dataset/train"));
        assert_eq!(
            config.pretrained_weights,
            Some(PathBuf::from("weights/resnet18.pth"))
        );
        assert!(!config.from_scratch);
    }

    #[test]
    fn test_backbone_must_be_pretrained_unless_opted_out() {
        let config = TrainingConfig {
            pretrained_weights: None,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ClassifierError::Config(_))));

        let config = TrainingConfig {
            pretrained_weights: None,
            from_scratch: true,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("train.toml");
        fs::write(
            &path,
            r#"
data_dir = "/data/six_classes"
num_epochs = 3

[augmentation]
rotation_degrees = 5.0
"#,
        )
        .unwrap();

        let config = TrainingConfig::load(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/data/six_classes"));
        assert_eq!(config.num_epochs, 3);
        assert_eq!(config.batch_size, 32);
        assert_eq!(config.augmentation.rotation_degrees, 5.0);
        assert_eq!(config.augmentation.horizontal_flip_prob, 0.5);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config = TrainingConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = TrainingConfig {
            checkpoint_name: "model.v2".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unreadable_config() {
        let err = FilterConfig::load(Path::new("/nonexistent/filter.toml")).unwrap_err();
        assert!(matches!(err, ClassifierError::Config(_)));
    }

    #[test]
    fn test_filter_defaults() {
        let config = FilterConfig::default();
        assert_eq!(config.target_class, "cat");
        assert_eq!(config.checkpoint, PathBuf::from("output/cat_classifier"));
    }
}
