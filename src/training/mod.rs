//! Training module: fine-tunes ResNet-18 on an image-folder dataset

pub mod trainer;

pub use trainer::{evaluate, run_training, EpochMetrics, TrainingSummary};
