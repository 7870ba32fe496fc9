//! Model module
//!
//! - `resnet`: the ResNet-18 network
//! - `pretrained`: ImageNet initialisation from a PyTorch state dict
//! - `labels`: class-index to class-name mapping
//! - `checkpoint`: saving and restoring weights plus metadata

pub mod checkpoint;
pub mod labels;
pub mod pretrained;
pub mod resnet;

pub use checkpoint::{
    load_checkpoint, save_checkpoint, CheckpointMetadata, CheckpointPaths, LoadedCheckpoint,
};
pub use labels::LabelMap;
pub use pretrained::load_pretrained;
pub use resnet::{ResNet18, ResNet18Config};
