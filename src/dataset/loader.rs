//! Image-folder dataset discovery
//!
//! A split directory holds one subdirectory per class; every image file
//! directly inside a class directory is one labeled sample.

use std::path::{Path, PathBuf};

use colored::Colorize;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use walkdir::WalkDir;

use super::is_image_file;
use crate::utils::error::{ClassifierError, Result};

/// A single image sample with its label
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSample {
    pub path: PathBuf,
    /// Position of the class directory in sorted order
    pub label: usize,
    pub class_name: String,
}

/// One split (`train/` or `test/`) of an image-folder dataset
#[derive(Debug, Clone)]
pub struct ImageFolder {
    pub root_dir: PathBuf,
    pub samples: Vec<ImageSample>,
    /// Class names indexed by label
    pub classes: Vec<String>,
}

impl ImageFolder {
    /// Scan a split directory laid out as:
    /// ```text
    /// root_dir/
    /// ├── car/
    /// │   ├── 001.jpg
    /// │   └── 002.png
    /// ├── cat/
    /// │   └── ...
    /// └── ...
    /// ```
    /// Class labels follow the byte-wise sorted order of the directory names.
    /// A class directory that cannot be named or listed aborts the scan, since
    /// dropping it would shift every later label.
    pub fn new<P: AsRef<Path>>(root_dir: P) -> Result<Self> {
        let root_dir = root_dir.as_ref().to_path_buf();
        info!("Scanning image folder: {:?}", root_dir);

        if !root_dir.is_dir() {
            return Err(ClassifierError::PathNotFound(root_dir));
        }

        let mut classes: Vec<String> = Vec::new();
        for entry in std::fs::read_dir(&root_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().into_string().map_err(|raw| {
                ClassifierError::Dataset(format!(
                    "Class directory {:?} in {:?} is not valid UTF-8",
                    raw, root_dir
                ))
            })?;
            classes.push(name);
        }
        classes.sort();

        let mut samples = Vec::new();
        for (label, class_name) in classes.iter().enumerate() {
            let class_dir = root_dir.join(class_name);
            let mut paths: Vec<PathBuf> = Vec::new();
            for entry in WalkDir::new(&class_dir).min_depth(1).max_depth(1) {
                let entry = entry.map_err(|e| {
                    ClassifierError::Dataset(format!("Failed to list {:?}: {}", class_dir, e))
                })?;
                if entry.file_type().is_file() && is_image_file(entry.path()) {
                    paths.push(entry.into_path());
                }
            }
            paths.sort();

            debug!("Class '{}' (label {}): {} images", class_name, label, paths.len());

            samples.extend(paths.into_iter().map(|path| ImageSample {
                path,
                label,
                class_name: class_name.clone(),
            }));
        }

        info!("Found {} images in {} classes", samples.len(), classes.len());

        Ok(Self {
            root_dir,
            samples,
            classes,
        })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    pub fn stats(&self) -> DatasetStats {
        let mut class_counts = vec![0usize; self.classes.len()];
        for sample in &self.samples {
            class_counts[sample.label] += 1;
        }

        DatasetStats {
            split: self
                .root_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            total_samples: self.samples.len(),
            classes: self.classes.clone(),
            class_counts,
        }
    }
}

/// Per-class sample counts of one split
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetStats {
    pub split: String,
    pub total_samples: usize,
    pub classes: Vec<String>,
    pub class_counts: Vec<usize>,
}

impl DatasetStats {
    pub fn print(&self) {
        println!();
        println!("{} {}", "📊 Split:".bold(), self.split.cyan());
        println!("  Total images: {}", self.total_samples);
        println!("  Classes:      {}", self.classes.len());
        for (name, count) in self.classes.iter().zip(self.class_counts.iter()) {
            let share = if self.total_samples > 0 {
                100.0 * *count as f64 / self.total_samples as f64
            } else {
                0.0
            };
            println!("    {:<12} {:>6}  ({:5.1}%)", name, count, share);
        }
    }
}
