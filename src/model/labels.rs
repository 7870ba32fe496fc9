//! Class-index ↔ class-name mapping persisted with every checkpoint.

use serde::{Deserialize, Serialize};

use crate::dataset::CLASS_NAMES;
use crate::utils::error::{ClassifierError, Result};

/// Ordered class names; position = network output index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelMap {
    names: Vec<String>,
}

impl Default for LabelMap {
    fn default() -> Self {
        Self::new(CLASS_NAMES.iter().map(|s| s.to_string()).collect())
    }
}

impl LabelMap {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Name for `index`; indices outside the map are an error, never a guess
    pub fn name(&self, index: usize) -> Result<&str> {
        self.names
            .get(index)
            .map(String::as_str)
            .ok_or(ClassifierError::UnknownClassIndex(index))
    }

    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| ClassifierError::UnknownClass(name.to_string()))
    }
}
