//! Inference module
//!
//! - `predictor`: [`ClassifierContext`] and single-image predictions
//! - `filter`: target-class verdicts for one image or a whole folder

pub mod filter;
pub mod predictor;

pub use filter::{FilterOutcome, FolderReport, ScanEntry, TargetFilter, Verdict};
pub use predictor::{argmax, softmax, ClassifierContext, Prediction};
