//! Burn Dataset Integration
//!
//! Implements Burn's `Dataset` and `Batcher` traits for image folders.
//!
//! - `ImageBatcher`: resize + normalise only (test split)
//! - `AugmentingBatcher`: random flip / rotation before normalising (train split)

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use burn::prelude::*;
use image::RgbImage;
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use super::augmentation::Augmenter;
use super::loader::ImageSample;
use super::transform::ImageTransform;
use crate::utils::error::Result;

/// A decoded, resized image with its label
#[derive(Clone, Debug)]
pub struct ImageItem {
    pub image: RgbImage,
    pub label: usize,
    pub path: String,
}

/// In-memory dataset of resized images
#[derive(Clone)]
pub struct ImageFolderDataset {
    items: Vec<ImageItem>,
}

impl std::fmt::Debug for ImageFolderDataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageFolderDataset")
            .field("len", &self.items.len())
            .finish()
    }
}

impl ImageFolderDataset {
    /// Decode and resize every sample up front (parallel).
    ///
    /// Fails on the first image that cannot be read; a training run never
    /// continues with a silently shrunken dataset.
    pub fn load(samples: &[ImageSample], transform: &ImageTransform) -> Result<Self> {
        let pb = ProgressBar::new(samples.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("  {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }

        let items = samples
            .par_iter()
            .map(|sample| {
                let image = transform.load(&sample.path);
                pb.inc(1);
                Ok(ImageItem {
                    image: image?,
                    label: sample.label,
                    path: sample.path.to_string_lossy().to_string(),
                })
            })
            .collect::<Result<Vec<_>>>();

        pb.finish_and_clear();
        Ok(Self::from_items(items?))
    }

    pub fn from_items(items: Vec<ImageItem>) -> Self {
        Self { items }
    }
}

impl Dataset<ImageItem> for ImageFolderDataset {
    fn get(&self, index: usize) -> Option<ImageItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// A batch of images for training or evaluation
#[derive(Clone, Debug)]
pub struct ImageBatch<B: Backend> {
    /// `[batch_size, 3, height, width]`
    pub images: Tensor<B, 4>,
    /// `[batch_size]`
    pub targets: Tensor<B, 1, Int>,
}

fn build_batch<B: Backend>(
    transform: &ImageTransform,
    images: impl Iterator<Item = (RgbImage, usize)>,
    device: &B::Device,
) -> ImageBatch<B> {
    let [channels, height, width] = transform.output_shape();
    let mut images_data = Vec::new();
    let mut targets_data: Vec<i64> = Vec::new();

    for (image, label) in images {
        images_data.extend(transform.to_tensor_data(&image));
        targets_data.push(label as i64);
    }
    let batch_size = targets_data.len();

    let images = Tensor::<B, 4>::from_floats(
        TensorData::new(images_data, [batch_size, channels, height, width]),
        device,
    );
    let targets =
        Tensor::<B, 1, Int>::from_data(TensorData::new(targets_data, [batch_size]), device);

    ImageBatch { images, targets }
}

/// Batcher without augmentation
#[derive(Clone, Debug)]
pub struct ImageBatcher {
    transform: ImageTransform,
}

impl ImageBatcher {
    pub fn new(transform: ImageTransform) -> Self {
        Self { transform }
    }
}

impl<B: Backend> Batcher<B, ImageItem, ImageBatch<B>> for ImageBatcher {
    fn batch(&self, items: Vec<ImageItem>, device: &B::Device) -> ImageBatch<B> {
        build_batch(
            &self.transform,
            items.into_iter().map(|item| (item.image, item.label)),
            device,
        )
    }
}

/// Batcher that augments every image before normalising it
///
/// Each batch gets its own RNG derived from `seed` and a shared batch
/// counter, so runs with the same seed see the same augmentation stream
/// when batches are produced in the same order.
#[derive(Clone, Debug)]
pub struct AugmentingBatcher {
    transform: ImageTransform,
    augmenter: Augmenter,
    seed: u64,
    batch_counter: Arc<AtomicU64>,
}

impl AugmentingBatcher {
    pub fn new(transform: ImageTransform, augmenter: Augmenter, seed: u64) -> Self {
        Self {
            transform,
            augmenter,
            seed,
            batch_counter: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl<B: Backend> Batcher<B, ImageItem, ImageBatch<B>> for AugmentingBatcher {
    fn batch(&self, items: Vec<ImageItem>, device: &B::Device) -> ImageBatch<B> {
        let batch_index = self.batch_counter.fetch_add(1, Ordering::Relaxed);
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed.wrapping_add(batch_index));

        let augmented: Vec<(RgbImage, usize)> = items
            .into_iter()
            .map(|item| (self.augmenter.augment(&item.image, &mut rng), item.label))
            .collect();

        build_batch(&self.transform, augmented.into_iter(), device)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DefaultBackend;
    use crate::dataset::augmentation::AugmentationConfig;
    use image::{ImageBuffer, Rgb};

    type TestBackend = DefaultBackend;

    fn item(label: usize, value: u8) -> ImageItem {
        ImageItem {
            image: ImageBuffer::from_pixel(16, 16, Rgb([value, value, value])),
            label,
            path: format!("img_{label}_{value}.png"),
        }
    }

    #[test]
    fn test_dataset_access() {
        let dataset = ImageFolderDataset::from_items(vec![item(0, 10), item(1, 20)]);

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.get(1).map(|i| i.label), Some(1));
        assert!(dataset.get(2).is_none());
    }

    #[test]
    fn test_batcher_shapes() {
        let device = Default::default();
        let batcher = ImageBatcher::new(ImageTransform::new(16));

        let batch: ImageBatch<TestBackend> =
            batcher.batch(vec![item(0, 10), item(1, 20), item(1, 30)], &device);

        assert_eq!(batch.images.dims(), [3, 3, 16, 16]);
        assert_eq!(batch.targets.dims(), [3]);
        let targets: Vec<i64> = batch.targets.into_data().convert::<i64>().to_vec().unwrap();
        assert_eq!(targets, vec![0, 1, 1]);
    }

    #[test]
    fn test_augmenting_batcher_shapes() {
        let device = Default::default();
        let batcher = AugmentingBatcher::new(
            ImageTransform::new(16),
            Augmenter::new(AugmentationConfig::default()),
            42,
        );

        let batch: ImageBatch<TestBackend> = batcher.batch(vec![item(0, 10), item(1, 20)], &device);
        assert_eq!(batch.images.dims(), [2, 3, 16, 16]);
    }

    #[test]
    fn test_load_fails_on_unreadable_image() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("bad.png");
        std::fs::write(&path, b"nope").unwrap();
        let samples = vec![ImageSample {
            path,
            label: 0,
            class_name: "cat".into(),
        }];

        assert!(ImageFolderDataset::load(&samples, &ImageTransform::new(16)).is_err());
    }
}
