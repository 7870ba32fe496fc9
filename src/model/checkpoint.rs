//! Checkpoint persistence
//!
//! A checkpoint is two files sharing a base name:
//! - `<name>.mpk`: model weights (`NamedMpkFileRecorder`, full f32 precision)
//! - `<name>.json`: [`CheckpointMetadata`], including the label map

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use burn::module::Module;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder};
use burn::tensor::backend::Backend;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::labels::LabelMap;
use super::resnet::{ResNet18, ResNet18Record};
use crate::dataset::ImageTransform;
use crate::utils::error::{ClassifierError, Result};

pub const WEIGHTS_EXTENSION: &str = "mpk";
pub const METADATA_EXTENSION: &str = "json";

type WeightsRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

/// Sidecar describing how the weights were produced and how to read their outputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    pub architecture: String,
    pub num_classes: usize,
    pub labels: LabelMap,
    pub transform: ImageTransform,
    pub epochs: usize,
    pub test_accuracy: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl CheckpointMetadata {
    pub fn new(labels: LabelMap, transform: ImageTransform, epochs: usize) -> Self {
        Self {
            architecture: "resnet18".to_string(),
            num_classes: labels.len(),
            labels,
            transform,
            epochs,
            test_accuracy: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_test_accuracy(mut self, accuracy: f64) -> Self {
        self.test_accuracy = Some(accuracy);
        self
    }
}

/// Locations of the two checkpoint files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointPaths {
    pub weights: PathBuf,
    pub metadata: PathBuf,
}

impl CheckpointPaths {
    /// `base` may end in `.mpk`, `.json` or neither. Other dots are part
    /// of the name (`run.2025_04_30` stays `run.2025_04_30.mpk`).
    pub fn from_base(base: &Path) -> Self {
        let stem = match base.extension().and_then(|ext| ext.to_str()) {
            Some(WEIGHTS_EXTENSION) | Some(METADATA_EXTENSION) => base.with_extension(""),
            _ => base.to_path_buf(),
        };

        Self {
            weights: append_extension(&stem, WEIGHTS_EXTENSION),
            metadata: append_extension(&stem, METADATA_EXTENSION),
        }
    }

    pub fn in_dir(dir: &Path, name: &str) -> Self {
        Self::from_base(&dir.join(name))
    }
}

fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// A model restored from disk together with its label map
#[derive(Debug)]
pub struct LoadedCheckpoint<B: Backend> {
    pub model: ResNet18<B>,
    pub labels: LabelMap,
    pub metadata: Option<CheckpointMetadata>,
}

/// Write weights and metadata, creating the directory if needed
pub fn save_checkpoint<B: Backend>(
    model: &ResNet18<B>,
    metadata: &CheckpointMetadata,
    paths: &CheckpointPaths,
) -> Result<()> {
    if let Some(parent) = paths.weights.parent() {
        fs::create_dir_all(parent)?;
    }

    model
        .clone()
        .save_file(paths.weights.clone(), &WeightsRecorder::new())
        .map_err(|e| ClassifierError::Checkpoint(format!("Failed to save weights: {:?}", e)))?;

    fs::write(&paths.metadata, serde_json::to_string_pretty(metadata)?)?;

    info!("Checkpoint saved to {:?}", paths.weights);
    Ok(())
}

pub fn load_metadata(path: &Path) -> Result<CheckpointMetadata> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Restore a checkpoint whose head must be exactly `expected_classes` wide.
///
/// Without a metadata sidecar the built-in six-class label map is assumed.
pub fn load_checkpoint<B: Backend>(
    base: &Path,
    expected_classes: usize,
    device: &B::Device,
) -> Result<LoadedCheckpoint<B>> {
    let paths = CheckpointPaths::from_base(base);
    if !paths.weights.is_file() {
        return Err(ClassifierError::PathNotFound(paths.weights));
    }

    let metadata = if paths.metadata.is_file() {
        Some(load_metadata(&paths.metadata)?)
    } else {
        warn!(
            "No metadata found at {:?}; using the built-in label map",
            paths.metadata
        );
        None
    };

    let labels = metadata
        .as_ref()
        .map(|m| m.labels.clone())
        .unwrap_or_default();
    if labels.len() != expected_classes {
        return Err(ClassifierError::ClassCountMismatch {
            expected: expected_classes,
            found: labels.len(),
        });
    }

    let record: ResNet18Record<B> = WeightsRecorder::new()
        .load(paths.weights.clone(), device)
        .map_err(|e| ClassifierError::Checkpoint(format!("Failed to load weights: {:?}", e)))?;

    let head_width = record.fc.weight.val().dims()[1];
    if head_width != expected_classes {
        return Err(ClassifierError::ClassCountMismatch {
            expected: expected_classes,
            found: head_width,
        });
    }

    let model = ResNet18::new(expected_classes, device).load_record(record);
    info!("Loaded checkpoint {:?} ({} classes)", paths.weights, head_width);

    Ok(LoadedCheckpoint {
        model,
        labels,
        metadata,
    })
}
