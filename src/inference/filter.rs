//! Target-class filter ("is this a cat?")
//!
//! Runs a [`ClassifierContext`] over one image or over every recognised
//! image in a folder and reports whether each prediction is the target class.

use std::fs;
use std::path::{Path, PathBuf};

use burn::tensor::backend::Backend;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::predictor::{ClassifierContext, Prediction};
use crate::dataset::is_image_file;
use crate::utils::error::{ClassifierError, Result};

/// Prediction for one file plus the match decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub file_name: String,
    pub target_class: String,
    pub is_target: bool,
    pub prediction: Prediction,
}

impl Verdict {
    /// One-line console message
    pub fn message(&self) -> String {
        if self.is_target {
            format!("🐱 '{}' is {}!", self.file_name, self.target_class)
        } else {
            format!(
                "❌ '{}' is not {}! (Predict: {})",
                self.file_name, self.target_class, self.prediction.class_name
            )
        }
    }
}

/// One examined file of a folder scan
#[derive(Debug, Clone)]
pub enum ScanEntry {
    Checked(Verdict),
    Failed { path: PathBuf, error: String },
}

/// Outcome of a folder scan, in file-name order
#[derive(Debug, Clone, Default)]
pub struct FolderReport {
    pub folder: PathBuf,
    pub entries: Vec<ScanEntry>,
    /// Files without a recognised image extension
    pub skipped: Vec<PathBuf>,
}

impl FolderReport {
    pub fn verdicts(&self) -> impl Iterator<Item = &Verdict> {
        self.entries.iter().filter_map(|entry| match entry {
            ScanEntry::Checked(verdict) => Some(verdict),
            ScanEntry::Failed { .. } => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.entries.iter().filter_map(|entry| match entry {
            ScanEntry::Failed { path, error } => Some((path.as_path(), error.as_str())),
            ScanEntry::Checked(_) => None,
        })
    }

    pub fn matches(&self) -> usize {
        self.verdicts().filter(|v| v.is_target).count()
    }
}

/// What [`TargetFilter::check`] found
#[derive(Debug, Clone)]
pub enum FilterOutcome {
    Single(Verdict),
    Folder(FolderReport),
}

/// Classifies images and flags those predicted as `target_class`
#[derive(Debug)]
pub struct TargetFilter<B: Backend> {
    context: ClassifierContext<B>,
    target_class: String,
    target_index: usize,
}

impl<B: Backend> TargetFilter<B> {
    /// Fails if the label map does not contain `target_class`
    pub fn new(context: ClassifierContext<B>, target_class: &str) -> Result<Self> {
        let target_index = context.labels().index_of(target_class)?;
        Ok(Self {
            context,
            target_class: target_class.to_string(),
            target_index,
        })
    }

    pub fn check_image(&self, path: &Path) -> Result<Verdict> {
        let prediction = self.context.predict_path(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Verdict {
            file_name,
            target_class: self.target_class.clone(),
            is_target: prediction.class_index == self.target_index,
            prediction,
        })
    }

    /// Check every image directly inside `folder`.
    ///
    /// Files with other extensions are skipped. A file that fails to decode
    /// is recorded as a failure and the scan moves on.
    pub fn scan_folder(&self, folder: &Path) -> Result<FolderReport> {
        if !folder.is_dir() {
            return Err(ClassifierError::PathNotFound(folder.to_path_buf()));
        }

        let mut files: Vec<PathBuf> = Vec::new();
        for entry in fs::read_dir(folder)? {
            let path = entry?.path();
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();

        let mut report = FolderReport {
            folder: folder.to_path_buf(),
            ..Default::default()
        };

        for path in files {
            if !is_image_file(&path) {
                report.skipped.push(path);
                continue;
            }

            match self.check_image(&path) {
                Ok(verdict) => report.entries.push(ScanEntry::Checked(verdict)),
                Err(err) => {
                    warn!("Skipping {:?}: {}", path, err);
                    report.entries.push(ScanEntry::Failed {
                        path,
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            "Scanned {:?}: {} checked, {} matched, {} skipped, {} failed",
            folder,
            report.verdicts().count(),
            report.matches(),
            report.skipped.len(),
            report.failures().count()
        );
        Ok(report)
    }

    /// Single file or folder, depending on what `path` is
    pub fn check(&self, path: &Path) -> Result<FilterOutcome> {
        if path.is_dir() {
            self.scan_folder(path).map(FilterOutcome::Folder)
        } else if path.is_file() {
            self.check_image(path).map(FilterOutcome::Single)
        } else {
            Err(ClassifierError::PathNotFound(path.to_path_buf()))
        }
    }
}
