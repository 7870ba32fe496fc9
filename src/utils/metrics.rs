//! Test-split evaluation: a confusion matrix with per-class recall.

use serde::{Deserialize, Serialize};

/// Counts indexed by (actual, predicted) class
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub num_classes: usize,

    /// Row = actual, column = predicted, flat row-major
    pub counts: Vec<usize>,
}

impl ConfusionMatrix {
    pub fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            counts: vec![0; num_classes * num_classes],
        }
    }

    /// Record one prediction; out-of-range indices are ignored
    pub fn add(&mut self, actual: usize, predicted: usize) {
        if actual < self.num_classes && predicted < self.num_classes {
            self.counts[actual * self.num_classes + predicted] += 1;
        }
    }

    pub fn get(&self, actual: usize, predicted: usize) -> usize {
        if actual < self.num_classes && predicted < self.num_classes {
            self.counts[actual * self.num_classes + predicted]
        } else {
            0
        }
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    pub fn correct(&self) -> usize {
        (0..self.num_classes).map(|c| self.get(c, c)).sum()
    }

    /// Overall accuracy; 0.0 when nothing was recorded
    pub fn accuracy(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.correct() as f64 / total as f64,
        }
    }

    /// Number of test samples whose true class is `actual`
    pub fn support(&self, actual: usize) -> usize {
        (0..self.num_classes).map(|p| self.get(actual, p)).sum()
    }

    /// Recall per class (`None` for classes with no samples)
    pub fn per_class_accuracy(&self) -> Vec<Option<f64>> {
        (0..self.num_classes)
            .map(|c| match self.support(c) {
                0 => None,
                n => Some(self.get(c, c) as f64 / n as f64),
            })
            .collect()
    }

    /// Matrix, per-class accuracy and overall accuracy as text.
    /// Rows and columns are labelled with `class_names` when given.
    pub fn display(&self, class_names: Option<&[String]>) -> String {
        let label = |idx: usize, width: usize| -> String {
            match class_names.and_then(|names| names.get(idx)) {
                Some(name) => name.chars().take(width).collect(),
                None => idx.to_string(),
            }
        };

        let mut out = String::from("\nConfusion Matrix (rows=actual, cols=predicted):\n\n");

        out.push_str(&" ".repeat(10));
        for col in 0..self.num_classes {
            out.push_str(&format!("{:>6}", label(col, 6)));
        }
        out.push('\n');

        for row in 0..self.num_classes {
            out.push_str(&format!("{:>8} ", label(row, 8)));
            for col in 0..self.num_classes {
                let count = self.get(row, col);
                let cell = match (row == col, count) {
                    (true, n) => format!("[{:>4}]", n),
                    (false, 0) => "    . ".to_string(),
                    (false, n) => format!(" {:>4} ", n),
                };
                out.push_str(&cell);
            }
            out.push('\n');
        }

        out.push_str("\nPer-class accuracy:\n");
        for (class, recall) in self.per_class_accuracy().into_iter().enumerate() {
            let value = match recall {
                Some(r) => format!("{:>6.2}%", r * 100.0),
                None => "   n/a ".to_string(),
            };
            out.push_str(&format!(
                "  {:<10} {} ({} samples)\n",
                label(class, 10),
                value,
                self.support(class)
            ));
        }

        out.push_str(&format!("\nAccuracy: {:.2}%\n", self.accuracy() * 100.0));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(pairs: &[(usize, usize)], num_classes: usize) -> ConfusionMatrix {
        let mut cm = ConfusionMatrix::new(num_classes);
        for &(actual, predicted) in pairs {
            cm.add(actual, predicted);
        }
        cm
    }

    #[test]
    fn test_counts_and_accuracy() {
        let cm = matrix(&[(0, 0), (1, 1), (2, 1), (2, 2), (2, 2), (0, 2)], 3);

        assert_eq!(cm.total(), 6);
        assert_eq!(cm.correct(), 4);
        assert_eq!(cm.get(2, 1), 1);
        assert_eq!(cm.get(0, 2), 1);
        assert_eq!(cm.support(2), 3);
        assert!((cm.accuracy() - 4.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_range_ignored() {
        let cm = matrix(&[(0, 5), (7, 0)], 2);
        assert_eq!(cm.total(), 0);
        assert_eq!(cm.accuracy(), 0.0);
    }

    #[test]
    fn test_per_class_accuracy_handles_empty_rows() {
        let per_class = matrix(&[(0, 0), (1, 0)], 3).per_class_accuracy();

        assert_eq!(per_class[0], Some(1.0));
        assert_eq!(per_class[1], Some(0.0));
        assert_eq!(per_class[2], None);
    }

    #[test]
    fn test_display_reports_each_class() {
        let cm = matrix(&[(0, 0), (0, 0), (1, 0), (1, 1)], 3);
        let names = vec!["cat".to_string(), "dog".to_string(), "car".to_string()];
        let text = cm.display(Some(&names));

        assert!(text.contains("Per-class accuracy"));
        assert!(text.contains("cat        100.00% (2 samples)"));
        assert!(text.contains("dog         50.00% (2 samples)"));
        assert!(text.contains("car           n/a  (0 samples)"));
        assert!(text.contains("Accuracy: 75.00%"));
    }
}
