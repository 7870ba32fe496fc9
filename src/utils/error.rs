//! Error types for the classifier library.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for training, checkpoint and inference operations
#[derive(Error, Debug)]
pub enum ClassifierError {
    /// An image could not be opened or decoded
    #[error("Failed to load image at '{0}': {1}")]
    ImageLoad(PathBuf, String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Model error: {0}")]
    Model(String),

    /// Weights or metadata could not be written or read
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// Network head width (or label count) disagrees with the expected class count
    #[error("Class count mismatch: expected {expected}, found {found}")]
    ClassCountMismatch { expected: usize, found: usize },

    /// The network produced an index the label map does not define
    #[error("Class index {0} is not defined in the label map")]
    UnknownClassIndex(usize),

    #[error("Unknown class name '{0}'")]
    UnknownClass(String),

    #[error("Training error: {0}")]
    Training(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),
}

impl From<serde_json::Error> for ClassifierError {
    fn from(err: serde_json::Error) -> Self {
        ClassifierError::Serialization(err.to_string())
    }
}

/// Convenience Result type for classifier operations
pub type Result<T> = std::result::Result<T, ClassifierError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClassifierError::Dataset("empty split".to_string());
        assert_eq!(format!("{}", err), "Dataset error: empty split");
    }

    #[test]
    fn test_image_load_error_mentions_path() {
        let err = ClassifierError::ImageLoad(PathBuf::from("/data/cat.jpg"), "truncated".into());
        assert!(err.to_string().contains("cat.jpg"));
    }

    #[test]
    fn test_class_count_mismatch_display() {
        let err = ClassifierError::ClassCountMismatch { expected: 6, found: 1000 };
        assert_eq!(err.to_string(), "Class count mismatch: expected 6, found 1000");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ClassifierError = io.into();
        assert!(matches!(err, ClassifierError::Io(_)));
    }
}
