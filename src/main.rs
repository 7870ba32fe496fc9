//! cat_classifier CLI
//!
//! `train` fine-tunes the network, `filter` reports cat / not cat for an image
//! or folder, `stats` prints the dataset class distribution.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use cat_classifier::backend::{backend_name, default_device, DefaultBackend, TrainingBackend};
use cat_classifier::dataset::ImageFolder;
use cat_classifier::inference::{
    ClassifierContext, FilterOutcome, FolderReport, ScanEntry, TargetFilter, Verdict,
};
use cat_classifier::utils::logging::{init_logging, LogConfig};
use cat_classifier::{run_training, FilterConfig, TrainingConfig};

/// Six-class image classifier with a cat / not-cat filter
#[derive(Parser, Debug)]
#[command(name = "cat_classifier")]
#[command(version)]
#[command(about = "Fine-tune ResNet-18 on six classes and filter cat images", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true, default_value = "false")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fine-tune the classifier on `<data-dir>/{train,test}/<class>/*`
    Train {
        /// TOML file with training settings; flags below override it
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Dataset root containing train/ and test/
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Directory for the checkpoint
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Number of training epochs
        #[arg(short, long)]
        epochs: Option<usize>,

        #[arg(short, long)]
        batch_size: Option<usize>,

        #[arg(short, long)]
        learning_rate: Option<f64>,

        /// Expected number of class directories
        #[arg(long)]
        num_classes: Option<usize>,

        /// Network input size in pixels
        #[arg(long)]
        image_size: Option<u32>,

        /// torchvision resnet18 state dict (.pth or .safetensors) for ImageNet initialisation
        #[arg(long)]
        pretrained: Option<PathBuf>,

        /// Skip ImageNet initialisation and train from random weights
        #[arg(long)]
        from_scratch: bool,

        /// Random seed for shuffling and augmentation
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Report whether an image (or every image in a folder) is the target class
    Filter {
        /// Image file or folder
        #[arg(short, long)]
        input: PathBuf,

        /// TOML file with filter settings; flags below override it
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Checkpoint base path (with or without .mpk)
        #[arg(short = 'm', long)]
        checkpoint: Option<PathBuf>,

        /// Class to look for
        #[arg(short, long)]
        target: Option<String>,

        /// Required classifier width
        #[arg(long)]
        num_classes: Option<usize>,
    },

    /// Show dataset statistics
    Stats {
        /// Dataset root containing train/ and test/
        #[arg(short, long, default_value = "dataset")]
        data_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    let _ = init_logging(&log_config);

    print_banner();

    match cli.command {
        Commands::Train {
            config,
            data_dir,
            output_dir,
            epochs,
            batch_size,
            learning_rate,
            num_classes,
            image_size,
            pretrained,
            from_scratch,
            seed,
        } => {
            let mut training = match config {
                Some(path) => TrainingConfig::load(&path)?,
                None => TrainingConfig::default(),
            };
            if let Some(v) = data_dir {
                training.data_dir = v;
            }
            if let Some(v) = output_dir {
                training.output_dir = v;
            }
            if let Some(v) = epochs {
                training.num_epochs = v;
            }
            if let Some(v) = batch_size {
                training.batch_size = v;
            }
            if let Some(v) = learning_rate {
                training.learning_rate = v;
            }
            if let Some(v) = num_classes {
                training.num_classes = v;
            }
            if let Some(v) = image_size {
                training.image_size = v;
            }
            if let Some(v) = pretrained {
                training.pretrained_weights = Some(v);
            }
            if let Some(v) = seed {
                training.seed = v;
            }
            if from_scratch {
                training.from_scratch = true;
            }

            cmd_train(&training)?;
        }

        Commands::Filter {
            input,
            config,
            checkpoint,
            target,
            num_classes,
        } => {
            let mut filter = match config {
                Some(path) => FilterConfig::load(&path)?,
                None => FilterConfig::default(),
            };
            if let Some(v) = checkpoint {
                filter.checkpoint = v;
            }
            if let Some(v) = target {
                filter.target_class = v;
            }
            if let Some(v) = num_classes {
                filter.num_classes = v;
            }

            cmd_filter(&input, &filter)?;
        }

        Commands::Stats { data_dir } => {
            cmd_stats(&data_dir)?;
        }
    }

    Ok(())
}

fn print_banner() {
    println!(
        "{}",
        format!(
            "🐾 cat_classifier v{} | ResNet-18 + Burn | backend: {}",
            cat_classifier::VERSION,
            backend_name()
        )
        .green()
        .bold()
    );
    println!();
}

fn cmd_train(config: &TrainingConfig) -> Result<()> {
    info!("Training with data from {:?}", config.data_dir);
    let device = default_device();
    let summary = run_training::<TrainingBackend>(config, &device)?;

    println!();
    println!("{}", "Next steps:".cyan().bold());
    println!(
        "  • Filter images: {}",
        filter_command(&summary.checkpoint.weights).join(" ")
    );
    Ok(())
}

/// Command line that runs the filter against a freshly trained checkpoint
fn filter_command(checkpoint: &Path) -> Vec<String> {
    vec![
        "cat_classifier".to_string(),
        "filter".to_string(),
        "--input".to_string(),
        "<image-or-folder>".to_string(),
        "--checkpoint".to_string(),
        checkpoint.display().to_string(),
    ]
}

fn cmd_filter(input: &Path, config: &FilterConfig) -> Result<()> {
    let device = default_device();
    let context =
        ClassifierContext::<DefaultBackend>::load(&config.checkpoint, config.num_classes, &device)?;
    let filter = TargetFilter::new(context, &config.target_class)?;

    match filter.check(input)? {
        FilterOutcome::Single(verdict) => print_verdict(&verdict),
        FilterOutcome::Folder(report) => print_report(&report),
    }
    Ok(())
}

fn print_verdict(verdict: &Verdict) {
    println!("{}", verdict.message());
    println!(
        "   {} {:.1}%",
        "confidence:".dimmed(),
        verdict.prediction.confidence * 100.0
    );
}

fn print_report(report: &FolderReport) {
    for entry in &report.entries {
        match entry {
            ScanEntry::Checked(verdict) => {
                println!("🔍 Checking: {}", verdict.file_name);
                print_verdict(verdict);
            }
            ScanEntry::Failed { path, error } => {
                println!("{} {:?}: {}", "⚠️  Failed:".yellow(), path, error);
            }
        }
    }

    println!();
    println!(
        "{} {} checked, {} matched, {} skipped, {} failed",
        "Summary:".cyan().bold(),
        report.verdicts().count(),
        report.matches(),
        report.skipped.len(),
        report.failures().count()
    );
}

fn cmd_stats(data_dir: &Path) -> Result<()> {
    for split in ["train", "test"] {
        let dir = data_dir.join(split);
        if !dir.is_dir() {
            println!("{} {:?} not found", "Note:".yellow(), dir);
            continue;
        }
        ImageFolder::new(&dir)?.stats().print();
    }
    Ok(())
}
