//! Image preprocessing shared by training and inference
//!
//! Decode → RGB → resize to `image_size × image_size` (bilinear) → CHW floats
//! in `[0, 1]` → per-channel ImageNet normalisation. The training batcher and
//! the inference context both go through [`ImageTransform`], so the two paths
//! cannot drift apart.

use std::path::Path;

use burn::prelude::*;
use image::{imageops::FilterType, DynamicImage, ImageReader, RgbImage};
use serde::{Deserialize, Serialize};

use crate::utils::error::{ClassifierError, Result};
use crate::IMAGE_SIZE;

/// ImageNet channel means (RGB)
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// ImageNet channel standard deviations (RGB)
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Resize + normalise transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageTransform {
    pub image_size: u32,
    pub mean: [f32; 3],
    pub std: [f32; 3],
}

impl Default for ImageTransform {
    fn default() -> Self {
        Self::new(IMAGE_SIZE as u32)
    }
}

impl ImageTransform {
    /// ImageNet-normalised transform producing `image_size × image_size` inputs
    pub fn new(image_size: u32) -> Self {
        Self {
            image_size,
            mean: IMAGENET_MEAN,
            std: IMAGENET_STD,
        }
    }

    /// `[channels, height, width]` of the produced tensor
    pub fn output_shape(&self) -> [usize; 3] {
        let size = self.image_size as usize;
        [3, size, size]
    }

    /// Open and decode an image, drop alpha and resize it
    pub fn load(&self, path: &Path) -> Result<RgbImage> {
        let img = ImageReader::open(path)
            .map_err(|e| ClassifierError::ImageLoad(path.to_path_buf(), e.to_string()))?
            .with_guessed_format()
            .map_err(|e| ClassifierError::ImageLoad(path.to_path_buf(), e.to_string()))?
            .decode()
            .map_err(|e| ClassifierError::ImageLoad(path.to_path_buf(), e.to_string()))?;

        Ok(self.resize(&img))
    }

    pub fn resize(&self, img: &DynamicImage) -> RgbImage {
        img.resize_exact(self.image_size, self.image_size, FilterType::Triangle)
            .to_rgb8()
    }

    /// Convert a resized RGB image into normalised CHW float data
    pub fn to_tensor_data(&self, rgb: &RgbImage) -> Vec<f32> {
        let (width, height) = rgb.dimensions();
        let plane = (width * height) as usize;
        let mut data = vec![0.0f32; 3 * plane];

        for (x, y, pixel) in rgb.enumerate_pixels() {
            let offset = (y * width + x) as usize;
            for c in 0..3 {
                let value = pixel[c] as f32 / 255.0;
                data[c * plane + offset] = (value - self.mean[c]) / self.std[c];
            }
        }

        data
    }

    /// Single-image batch `[1, 3, H, W]` on `device`
    pub fn to_batch<B: Backend>(&self, rgb: &RgbImage, device: &B::Device) -> Tensor<B, 4> {
        let [c, h, w] = self.output_shape();
        let data = self.to_tensor_data(rgb);
        Tensor::<B, 4>::from_floats(TensorData::new(data, [1, c, h, w]), device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb, Rgba};
    use tempfile::TempDir;

    fn gradient_image(w: u32, h: u32) -> DynamicImage {
        let img = ImageBuffer::from_fn(w, h, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 128]));
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn test_output_shape_is_3x224x224() {
        let transform = ImageTransform::default();
        let data = transform.to_tensor_data(&transform.resize(&gradient_image(640, 480)));

        assert_eq!(transform.output_shape(), [3, 224, 224]);
        assert_eq!(data.len(), 3 * 224 * 224);
    }

    #[test]
    fn test_normalization_per_channel() {
        let transform = ImageTransform::new(4);
        let rgb = ImageBuffer::from_pixel(4, 4, Rgb([255u8, 0, 51]));
        let data = transform.to_tensor_data(&rgb);
        let plane = 16;

        let expected_r = (1.0 - IMAGENET_MEAN[0]) / IMAGENET_STD[0];
        let expected_g = (0.0 - IMAGENET_MEAN[1]) / IMAGENET_STD[1];
        let expected_b = (0.2 - IMAGENET_MEAN[2]) / IMAGENET_STD[2];

        assert!((data[0] - expected_r).abs() < 1e-5);
        assert!((data[plane] - expected_g).abs() < 1e-5);
        assert!((data[2 * plane + 5] - expected_b).abs() < 1e-5);
    }

    #[test]
    fn test_mean_colored_image_normalizes_near_zero() {
        let transform = ImageTransform::new(8);
        let pixel = [
            (IMAGENET_MEAN[0] * 255.0).round() as u8,
            (IMAGENET_MEAN[1] * 255.0).round() as u8,
            (IMAGENET_MEAN[2] * 255.0).round() as u8,
        ];
        let rgb = ImageBuffer::from_pixel(8, 8, Rgb(pixel));

        let data = transform.to_tensor_data(&rgb);
        assert!(data.iter().all(|v| v.abs() < 0.01));
    }

    #[test]
    fn test_load_drops_alpha_and_resizes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("rgba.png");
        ImageBuffer::from_pixel(50, 30, Rgba([10u8, 20, 30, 0]))
            .save(&path)
            .unwrap();

        let rgb = ImageTransform::new(32).load(&path).unwrap();
        assert_eq!(rgb.dimensions(), (32, 32));
        assert_eq!(rgb.get_pixel(0, 0).0, [10, 20, 30]);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();

        let err = ImageTransform::default().load(&path).unwrap_err();
        assert!(matches!(err, ClassifierError::ImageLoad(_, _)));
    }
}
