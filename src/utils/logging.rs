//! Logging Module
//!
//! Structured logging through the `tracing` crate, plus a small helper that
//! reports epoch timings while training.

use std::time::Instant;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use super::error::{ClassifierError, Result};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter used when `RUST_LOG` is unset
    pub default_directive: String,
    /// Whether to include target (module path)
    pub include_target: bool,
    /// Whether to include thread IDs
    pub include_thread_ids: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_directive: "info".to_string(),
            include_target: false,
            include_thread_ids: false,
        }
    }
}

impl LogConfig {
    /// Debug level with module paths and thread ids
    pub fn verbose() -> Self {
        Self {
            default_directive: "debug".to_string(),
            include_target: true,
            include_thread_ids: true,
        }
    }

    /// `RUST_LOG` when set and valid, the default directive otherwise
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_directive))
    }
}

/// Install the global subscriber
pub fn init_logging(config: &LogConfig) -> Result<()> {
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(config.include_target)
                .with_thread_ids(config.include_thread_ids)
                .compact(),
        )
        .with(config.env_filter())
        .try_init()
        .map_err(|e| ClassifierError::Config(format!("Failed to initialize logger: {e}")))
}

/// Training progress logger
pub struct TrainingLogger {
    epoch: usize,
    total_epochs: usize,
    epoch_start: Instant,
    training_start: Instant,
}

impl TrainingLogger {
    pub fn new(total_epochs: usize) -> Self {
        Self {
            epoch: 0,
            total_epochs,
            epoch_start: Instant::now(),
            training_start: Instant::now(),
        }
    }

    /// Log start of an epoch (zero-based)
    pub fn start_epoch(&mut self, epoch: usize) {
        self.epoch = epoch;
        self.epoch_start = Instant::now();

        tracing::debug!("Epoch {}/{} started", epoch + 1, self.total_epochs);
    }

    /// Log end of an epoch with its training loss and accuracy
    pub fn end_epoch(&self, train_loss: f64, train_accuracy: f64) {
        let epoch_time = self.epoch_start.elapsed();

        tracing::info!(
            "Epoch {}/{} completed in {:.1}s | Loss: {:.4} | Acc: {:.2}% | ETA: {:.0}s",
            self.epoch + 1,
            self.total_epochs,
            epoch_time.as_secs_f64(),
            train_loss,
            train_accuracy * 100.0,
            self.eta_secs()
        );
    }

    /// Log training completion with the final test accuracy
    pub fn log_complete(&self, test_accuracy: f64) {
        tracing::info!(
            "Training complete! {} epochs in {:.1}s | Test accuracy: {:.2}%",
            self.total_epochs,
            self.training_start.elapsed().as_secs_f64(),
            test_accuracy * 100.0
        );
    }

    fn eta_secs(&self) -> f64 {
        let done = self.epoch + 1;
        let remaining = self.total_epochs.saturating_sub(done);
        let avg_epoch_time = self.training_start.elapsed().as_secs_f64() / done as f64;
        remaining as f64 * avg_epoch_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_config_presets() {
        assert_eq!(LogConfig::default().default_directive, "info");

        let verbose = LogConfig::verbose();
        assert_eq!(verbose.default_directive, "debug");
        assert!(verbose.include_target);
    }

    #[test]
    fn test_training_logger_eta_reaches_zero_on_last_epoch() {
        let mut logger = TrainingLogger::new(3);
        logger.start_epoch(2);
        assert_eq!(logger.eta_secs(), 0.0);
    }
}
