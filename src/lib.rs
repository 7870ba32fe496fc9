//! # cat_classifier
//!
//! Fine-tunes a ResNet-18 on a six-class image dataset (car, cat, dog, food,
//! human, text) with the Burn framework, and uses the trained checkpoint to
//! decide whether images show a cat.
//!
//! ## Modules
//!
//! - `dataset`: image-folder discovery, preprocessing, augmentation, Burn batchers
//! - `model`: ResNet-18, ImageNet initialisation, checkpoints and label maps
//! - `training`: the fine-tuning loop
//! - `inference`: prediction context and the cat / not-cat filter
//! - `config`: TOML-backed settings
//! - `utils`: errors, logging, metrics
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cat_classifier::backend::{default_device, DefaultBackend, TrainingBackend};
//! use cat_classifier::inference::{ClassifierContext, TargetFilter};
//! use cat_classifier::{run_training, TrainingConfig};
//!
//! let device = default_device();
//! let summary = run_training::<TrainingBackend>(&TrainingConfig::default(), &device)?;
//!
//! let context = ClassifierContext::<DefaultBackend>::load(&summary.checkpoint.weights, 6, &device)?;
//! let filter = TargetFilter::new(context, "cat")?;
//! println!("{}", filter.check_image("photo.jpg".as_ref())?.message());
//! ```

pub mod backend;
pub mod config;
pub mod dataset;
pub mod inference;
pub mod model;
pub mod training;
pub mod utils;

pub use config::{FilterConfig, TrainingConfig};
pub use inference::{ClassifierContext, Prediction, TargetFilter, Verdict};
pub use model::{CheckpointMetadata, LabelMap, ResNet18};
pub use training::{run_training, TrainingSummary};
pub use utils::error::{ClassifierError, Result};

/// Number of classes in the six-class dataset
pub const NUM_CLASSES: usize = 6;

/// Side length of the square network input
pub const IMAGE_SIZE: usize = 224;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
