//! Data augmentation for the training split
//!
//! Each training image is mirrored horizontally with probability
//! `horizontal_flip_prob` and rotated about its centre by an angle drawn
//! uniformly from `[-rotation_degrees, +rotation_degrees]`. Rotation uses
//! nearest-neighbour sampling and fills uncovered pixels with black.
//! The test split and inference never go through this module.

use image::{imageops, Rgb, RgbImage};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Configuration for data augmentation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentationConfig {
    /// Probability of a horizontal flip (0.0 - 1.0)
    pub horizontal_flip_prob: f32,
    /// Maximum rotation angle in degrees (applies ±rotation_degrees)
    pub rotation_degrees: f32,
}

impl Default for AugmentationConfig {
    fn default() -> Self {
        Self {
            horizontal_flip_prob: 0.5,
            rotation_degrees: 10.0,
        }
    }
}

impl AugmentationConfig {
    pub fn is_enabled(&self) -> bool {
        self.horizontal_flip_prob > 0.0 || self.rotation_degrees > 0.0
    }
}

/// Applies random flips and rotations to already-resized images
#[derive(Clone, Debug)]
pub struct Augmenter {
    config: AugmentationConfig,
}

impl Augmenter {
    pub fn new(config: AugmentationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AugmentationConfig {
        &self.config
    }

    /// Apply the configured augmentations to a copy of `img`
    pub fn augment(&self, img: &RgbImage, rng: &mut ChaCha8Rng) -> RgbImage {
        if !self.config.is_enabled() {
            return img.clone();
        }

        let mut result = if rng.gen::<f32>() < self.config.horizontal_flip_prob {
            imageops::flip_horizontal(img)
        } else {
            img.clone()
        };

        if self.config.rotation_degrees > 0.0 {
            let limit = self.config.rotation_degrees;
            let angle = rng.gen_range(-limit..=limit);
            result = rotate_nearest(&result, angle);
        }

        result
    }
}

/// Rotate counter-clockwise by `angle_degrees` about the image centre
pub fn rotate_nearest(img: &RgbImage, angle_degrees: f32) -> RgbImage {
    if angle_degrees == 0.0 {
        return img.clone();
    }

    let (width, height) = img.dimensions();
    let cx = (width as f32 - 1.0) * 0.5;
    let cy = (height as f32 - 1.0) * 0.5;
    let (sin_a, cos_a) = angle_degrees.to_radians().sin_cos();

    RgbImage::from_fn(width, height, |x, y| {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;

        // inverse mapping: output pixel -> source pixel
        let src_x = (cx + dx * cos_a - dy * sin_a).round();
        let src_y = (cy + dx * sin_a + dy * cos_a).round();

        if src_x < 0.0 || src_y < 0.0 || src_x >= width as f32 || src_y >= height as f32 {
            Rgb([0, 0, 0])
        } else {
            *img.get_pixel(src_x as u32, src_y as u32)
        }
    })
}
