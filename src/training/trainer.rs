//! Fine-tuning loop
//!
//! Manual epoch loop over pre-decoded images: shuffled batches from the train
//! split go through the augmenting batcher, cross-entropy loss and an Adam
//! step. After the last epoch the model is evaluated once on the test split
//! with the inner (non-autodiff) backend and saved.

use std::time::Instant;

use burn::{
    data::{dataloader::batcher::Batcher, dataset::Dataset},
    module::AutodiffModule,
    nn::loss::CrossEntropyLossConfig,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::{backend::AutodiffBackend, ElementConversion},
};
use colored::Colorize;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::TrainingConfig;
use crate::dataset::{
    AugmentingBatcher, Augmenter, ImageBatch, ImageBatcher, ImageFolder, ImageFolderDataset,
    ImageTransform,
};
use crate::model::{
    load_pretrained, save_checkpoint, CheckpointMetadata, CheckpointPaths, LabelMap, ResNet18,
    ResNet18Config,
};
use crate::utils::error::{ClassifierError, Result};
use crate::utils::logging::TrainingLogger;
use crate::utils::{format_duration, ConfusionMatrix};

/// Loss and accuracy over the training split for one epoch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// 1-based
    pub epoch: usize,
    /// Sample-weighted mean cross-entropy
    pub loss: f64,
    pub accuracy: f64,
}

/// Outcome of a full training run
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub epochs: Vec<EpochMetrics>,
    /// Accuracy on the test split, in `[0, 1]`
    pub test_accuracy: f64,
    pub confusion: ConfusionMatrix,
    pub checkpoint: CheckpointPaths,
    pub metadata: CheckpointMetadata,
}

/// Train, evaluate once on the test split, and write the checkpoint.
///
/// Any error (missing split, unreadable image, class mismatch, failed save)
/// aborts the run.
pub fn run_training<B: AutodiffBackend>(
    config: &TrainingConfig,
    device: &B::Device,
) -> Result<TrainingSummary> {
    config.validate()?;
    let started = Instant::now();

    println!("{}", "Loading Dataset...".cyan());
    let train_folder = ImageFolder::new(config.train_dir())?;
    let test_folder = ImageFolder::new(config.test_dir())?;
    let labels = check_splits(&train_folder, &test_folder, config.num_classes)?;

    train_folder.stats().print();
    test_folder.stats().print();
    println!();

    println!("{}", "Creating Model...".cyan());
    let mut model = build_model::<B>(config, device)?;

    let transform = ImageTransform::new(config.image_size);

    println!("{}", "Pre-loading Training Data...".cyan().bold());
    let train_dataset = ImageFolderDataset::load(&train_folder.samples, &transform)?;
    println!("{}", "Pre-loading Test Data...".cyan().bold());
    let test_dataset = ImageFolderDataset::load(&test_folder.samples, &transform)?;

    let mut optimizer = AdamConfig::new().init();
    let loss_fn = CrossEntropyLossConfig::new().init(device);
    let batcher = AugmentingBatcher::new(
        transform.clone(),
        Augmenter::new(config.augmentation.clone()),
        config.seed,
    );

    println!();
    println!("{}", "Training Configuration:".cyan().bold());
    println!("  🏷️  Training samples:  {}", train_dataset.len());
    println!("  🧪 Test samples:      {}", test_dataset.len());
    println!("  🔄 Epochs:            {}", config.num_epochs);
    println!("  📦 Batch size:        {}", config.batch_size);
    println!("  📈 Learning rate:     {}", config.learning_rate);
    println!("  🧠 Device:            {:?}", device);
    println!();

    let mut logger = TrainingLogger::new(config.num_epochs);
    let mut epoch_rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut history = Vec::with_capacity(config.num_epochs);

    for epoch in 0..config.num_epochs {
        logger.start_epoch(epoch);
        println!(
            "{}",
            format!("Epoch {}/{}", epoch + 1, config.num_epochs).yellow().bold()
        );

        let mut indices: Vec<usize> = (0..train_dataset.len()).collect();
        indices.shuffle(&mut epoch_rng);

        let mut running_loss = 0.0f64;
        let mut correct = 0usize;
        let mut seen = 0usize;

        for chunk in indices.chunks(config.batch_size) {
            let items: Vec<_> = chunk.iter().filter_map(|&i| train_dataset.get(i)).collect();
            let batch_len = items.len();
            let batch: ImageBatch<B> = batcher.batch(items, device);

            let output = model.forward(batch.images);
            let loss = loss_fn.forward(output.clone(), batch.targets.clone());

            let loss_value: f64 = loss.clone().into_scalar().elem();
            running_loss += loss_value * batch_len as f64;

            let batch_correct: i64 = output
                .argmax(1)
                .reshape([batch_len])
                .equal(batch.targets)
                .int()
                .sum()
                .into_scalar()
                .elem();
            correct += batch_correct as usize;
            seen += batch_len;

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optimizer.step(config.learning_rate, model, grads);
        }

        let metrics = EpochMetrics {
            epoch: epoch + 1,
            loss: running_loss / seen.max(1) as f64,
            accuracy: correct as f64 / seen.max(1) as f64,
        };
        println!(
            "  {} Loss: {:.4} | Acc: {:.2}%",
            "→".cyan(),
            metrics.loss,
            metrics.accuracy * 100.0
        );
        logger.end_epoch(metrics.loss, metrics.accuracy);
        history.push(metrics);
    }

    println!();
    println!("{}", "Evaluating on Test Split...".cyan().bold());
    let model = model.valid();
    let confusion = evaluate(
        &model,
        &test_dataset,
        &ImageBatcher::new(transform.clone()),
        config.batch_size,
        labels.len(),
        device,
    )?;
    let test_accuracy = confusion.accuracy();
    println!("{}", confusion.display(Some(labels.names())));
    logger.log_complete(test_accuracy);

    let metadata = CheckpointMetadata::new(labels, transform, config.num_epochs)
        .with_test_accuracy(test_accuracy);
    let checkpoint = config.checkpoint_paths();

    println!("{}", "Saving Model...".cyan());
    save_checkpoint(&model, &metadata, &checkpoint)?;
    println!("  💾 Saved to: {:?}", checkpoint.weights);
    println!();
    println!("{}", "Training Complete!".green().bold());
    println!(
        "  🎉 Test accuracy: {:.2}% ({} elapsed)",
        test_accuracy * 100.0,
        format_duration(started.elapsed().as_secs_f64())
    );

    Ok(TrainingSummary {
        epochs: history,
        test_accuracy,
        confusion,
        checkpoint,
        metadata,
    })
}

/// Both splits must be non-empty and share exactly `num_classes` classes
fn check_splits(train: &ImageFolder, test: &ImageFolder, num_classes: usize) -> Result<LabelMap> {
    if train.is_empty() {
        return Err(ClassifierError::Dataset(format!(
            "No images found in {:?}",
            train.root_dir
        )));
    }
    if test.is_empty() {
        return Err(ClassifierError::Dataset(format!(
            "No images found in {:?}",
            test.root_dir
        )));
    }
    if train.classes != test.classes {
        return Err(ClassifierError::Dataset(format!(
            "Train classes {:?} differ from test classes {:?}",
            train.classes, test.classes
        )));
    }
    if train.num_classes() != num_classes {
        return Err(ClassifierError::ClassCountMismatch {
            expected: num_classes,
            found: train.num_classes(),
        });
    }

    info!("Classes: {:?}", train.classes);
    Ok(LabelMap::new(train.classes.clone()))
}

fn build_model<B: Backend>(config: &TrainingConfig, device: &B::Device) -> Result<ResNet18<B>> {
    match (&config.pretrained_weights, config.from_scratch) {
        (Some(path), false) => load_pretrained(path, config.num_classes, device),
        (None, false) => Err(ClassifierError::Config(
            "No ImageNet weights configured for the backbone".into(),
        )),
        (_, true) => {
            warn!("Training from scratch; the backbone starts from random initialisation");
            Ok(ResNet18Config::new()
                .with_num_classes(config.num_classes)
                .init(device))
        }
    }
}

/// Confusion matrix of `model` over `dataset`, in order, without augmentation
pub fn evaluate<B: Backend>(
    model: &ResNet18<B>,
    dataset: &ImageFolderDataset,
    batcher: &ImageBatcher,
    batch_size: usize,
    num_classes: usize,
    device: &B::Device,
) -> Result<ConfusionMatrix> {
    let mut confusion = ConfusionMatrix::new(num_classes);
    let len = dataset.len();

    for start in (0..len).step_by(batch_size.max(1)) {
        let end = (start + batch_size).min(len);
        let items: Vec<_> = (start..end).filter_map(|i| dataset.get(i)).collect();
        if items.is_empty() {
            continue;
        }

        let batch: ImageBatch<B> = batcher.batch(items, device);
        let predictions = tensor_to_indices(model.forward(batch.images).argmax(1))?;
        let targets = tensor_to_indices(batch.targets)?;

        for (predicted, actual) in predictions.into_iter().zip(targets) {
            confusion.add(actual, predicted);
        }
    }

    Ok(confusion)
}

fn tensor_to_indices<B: Backend, const D: usize>(tensor: Tensor<B, D, Int>) -> Result<Vec<usize>> {
    let values: Vec<i64> = tensor
        .into_data()
        .convert::<i64>()
        .to_vec()
        .map_err(|e| ClassifierError::Training(format!("Failed to read tensor: {:?}", e)))?;
    Ok(values.into_iter().map(|v| v as usize).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DefaultBackend;
    use crate::dataset::ImageItem;
    use image::{ImageBuffer, Rgb};
    use std::path::Path;
    use tempfile::TempDir;

    fn split_with(root: &Path, classes: &[&str]) -> ImageFolder {
        for class in classes {
            let dir = root.join(class);
            std::fs::create_dir_all(&dir).unwrap();
            ImageBuffer::from_pixel(8, 8, Rgb([1u8, 2, 3]))
                .save(dir.join("a.png"))
                .unwrap();
        }
        ImageFolder::new(root).unwrap()
    }

    #[test]
    fn test_check_splits_class_count() {
        let temp = TempDir::new().unwrap();
        let train = split_with(&temp.path().join("train"), &["cat", "dog"]);
        let test = split_with(&temp.path().join("test"), &["cat", "dog"]);

        assert!(check_splits(&train, &test, 2).is_ok());
        assert!(matches!(
            check_splits(&train, &test, 6),
            Err(ClassifierError::ClassCountMismatch { expected: 6, found: 2 })
        ));
    }

    #[test]
    fn test_check_splits_mismatched_classes() {
        let temp = TempDir::new().unwrap();
        let train = split_with(&temp.path().join("train"), &["cat", "dog"]);
        let test = split_with(&temp.path().join("test"), &["car", "cat"]);

        assert!(matches!(
            check_splits(&train, &test, 2),
            Err(ClassifierError::Dataset(_))
        ));
    }

    #[test]
    fn test_evaluate_counts_every_sample() {
        let device = Default::default();
        let model = ResNet18::<DefaultBackend>::new(2, &device);
        let items = (0..5)
            .map(|i| ImageItem {
                image: ImageBuffer::from_pixel(32, 32, Rgb([i * 40, 0, 0])),
                label: (i % 2) as usize,
                path: format!("{i}.png"),
            })
            .collect();
        let dataset = ImageFolderDataset::from_items(items);

        let confusion = evaluate(
            &model,
            &dataset,
            &ImageBatcher::new(ImageTransform::new(32)),
            2,
            2,
            &device,
        )
        .unwrap();

        assert_eq!(confusion.total(), 5);
        assert!((0.0..=1.0).contains(&confusion.accuracy()));
    }
}
