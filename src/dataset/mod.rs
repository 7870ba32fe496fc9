//! Dataset handling for the image-folder classifier
//!
//! - `loader`: discovers `root/{split}/{class}/*` image folders
//! - `transform`: the resize + normalise pipeline shared by training and inference
//! - `augmentation`: random flip / rotation applied to the training split only
//! - `burn_dataset`: burn `Dataset` and `Batcher` implementations

pub mod augmentation;
pub mod burn_dataset;
pub mod loader;
pub mod transform;

pub use augmentation::{AugmentationConfig, Augmenter};
pub use burn_dataset::{AugmentingBatcher, ImageBatch, ImageBatcher, ImageFolderDataset, ImageItem};
pub use loader::{DatasetStats, ImageFolder, ImageSample};
pub use transform::{ImageTransform, IMAGENET_MEAN, IMAGENET_STD};

/// File extensions accepted as images (compared case-insensitively)
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Class names of the six-class dataset, in sorted directory order
pub const CLASS_NAMES: [&str; 6] = ["car", "cat", "dog", "food", "human", "text"];

/// Whether `path` has one of the [`IMAGE_EXTENSIONS`]
pub fn is_image_file(path: &std::path::Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_class_names_are_sorted() {
        let mut sorted = CLASS_NAMES.to_vec();
        sorted.sort();
        assert_eq!(sorted, CLASS_NAMES.to_vec());
    }

    #[test]
    fn test_is_image_file_case_insensitive() {
        assert!(is_image_file(Path::new("a/photo.JPG")));
        assert!(is_image_file(Path::new("photo.jpeg")));
        assert!(is_image_file(Path::new("photo.Png")));
        assert!(!is_image_file(Path::new("notes.txt")));
        assert!(!is_image_file(Path::new("photo.bmp")));
        assert!(!is_image_file(Path::new("README")));
    }
}
