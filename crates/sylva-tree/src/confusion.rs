//! Confusion matrix, plain accuracy and class-balanced accuracy.

use std::fmt;

use crate::error::TreeError;

/// A confusion matrix over integer class labels `0..n_classes`.
///
/// Entry `matrix[true_class][predicted_class]` counts how many rows with
/// true label `true_class` were predicted as `predicted_class`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfusionMatrix {
    matrix: Vec<Vec<usize>>,
    n_classes: usize,
}

/// Per-class precision, recall and support.
#[derive(Debug, Clone)]
pub struct ClassMetrics {
    /// The class label.
    pub class: u32,
    /// Precision: TP / (TP + FP). 0.0 if nothing was predicted as this class.
    pub precision: f64,
    /// Recall: TP / (TP + FN). `None` when the class has no true rows.
    pub recall: Option<f64>,
    /// Number of true rows in this class.
    pub support: usize,
}

impl ConfusionMatrix {
    /// Build a confusion matrix from true and predicted labels.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TreeError::EmptyDataset`] | Zero labels provided |
    /// | [`TreeError::LabelOutOfRange`] | A label is `>= n_classes` |
    pub fn from_labels(
        true_labels: &[u32],
        predicted: &[u32],
        n_classes: usize,
    ) -> Result<Self, TreeError> {
        if true_labels.is_empty() {
            return Err(TreeError::EmptyDataset);
        }
        let mut matrix = vec![vec![0usize; n_classes]; n_classes];
        for (&t, &p) in true_labels.iter().zip(predicted) {
            for label in [t, p] {
                if label as usize >= n_classes {
                    return Err(TreeError::LabelOutOfRange { label, n_classes });
                }
            }
            matrix[t as usize][p as usize] += 1;
        }
        Ok(Self { matrix, n_classes })
    }

    /// Overall accuracy: proportion of correct predictions.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let correct: usize = (0..self.n_classes).map(|i| self.matrix[i][i]).sum();
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64
        }
    }

    /// Unweighted mean of per-class recall.
    ///
    /// For two classes this is
    /// `correct_0 / (correct_0 + wrong_0) / 2 + correct_1 / (correct_1 + wrong_1) / 2`.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::UndefinedBalancedAccuracy`] naming the first class
    /// with no true rows; its recall has a zero denominator.
    pub fn balanced_accuracy(&self) -> Result<f64, TreeError> {
        let mut sum = 0.0;
        for m in self.class_metrics() {
            let recall = m
                .recall
                .ok_or(TreeError::UndefinedBalancedAccuracy { class: m.class })?;
            sum += recall;
        }
        Ok(sum / self.n_classes as f64)
    }

    /// Per-class precision, recall, and support.
    #[must_use]
    pub fn class_metrics(&self) -> Vec<ClassMetrics> {
        (0..self.n_classes)
            .map(|c| {
                let tp = self.matrix[c][c];
                let predicted: usize = (0..self.n_classes).map(|i| self.matrix[i][c]).sum();
                let support: usize = self.matrix[c].iter().sum();
                let precision = if predicted == 0 {
                    0.0
                } else {
                    tp as f64 / predicted as f64
                };
                let recall = (support > 0).then(|| tp as f64 / support as f64);
                ClassMetrics {
                    class: c as u32,
                    precision,
                    recall,
                    support,
                }
            })
            .collect()
    }

    /// Return the underlying matrix rows.
    #[must_use]
    pub fn as_rows(&self) -> &[Vec<usize>] {
        &self.matrix
    }

    /// Return the number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Return the number of labelled rows counted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.matrix.iter().flat_map(|row| row.iter()).sum()
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>8}", "")?;
        for j in 0..self.n_classes {
            write!(f, " pred_{j:>3}")?;
        }
        writeln!(f)?;

        for (i, row) in self.matrix.iter().enumerate() {
            write!(f, "true_{i:>3}")?;
            for val in row {
                write!(f, " {val:>8}")?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_predictions() {
        let labels = vec![0, 0, 1, 1];
        let cm = ConfusionMatrix::from_labels(&labels, &labels, 2).unwrap();
        assert!((cm.accuracy() - 1.0).abs() < f64::EPSILON);
        assert!((cm.balanced_accuracy().unwrap() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn balanced_accuracy_weights_classes_equally() {
        // 8 negatives all right, 2 positives: 1 right, 1 wrong.
        let true_labels = vec![0, 0, 0, 0, 0, 0, 0, 0, 1, 1];
        let predicted = vec![0, 0, 0, 0, 0, 0, 0, 0, 1, 0];
        let cm = ConfusionMatrix::from_labels(&true_labels, &predicted, 2).unwrap();
        assert!((cm.accuracy() - 0.9).abs() < 1e-12);
        assert!((cm.balanced_accuracy().unwrap() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn balanced_accuracy_undefined_without_support() {
        let cm = ConfusionMatrix::from_labels(&[0, 0], &[0, 1], 2).unwrap();
        assert!((cm.accuracy() - 0.5).abs() < f64::EPSILON);
        let err = cm.balanced_accuracy().unwrap_err();
        assert!(matches!(err, TreeError::UndefinedBalancedAccuracy { class: 1 }));
    }

    #[test]
    fn class_metrics_known_values() {
        let true_labels = vec![0, 0, 0, 1, 1, 1, 2, 2, 2];
        let predicted = vec![0, 0, 1, 1, 1, 2, 2, 2, 0];
        let cm = ConfusionMatrix::from_labels(&true_labels, &predicted, 3).unwrap();
        let metrics = cm.class_metrics();
        assert!((metrics[0].precision - 2.0 / 3.0).abs() < 1e-10);
        assert!((metrics[0].recall.unwrap() - 2.0 / 3.0).abs() < 1e-10);
        assert_eq!(metrics[0].support, 3);
        assert!((cm.accuracy() - 6.0 / 9.0).abs() < 1e-10);
        assert!((cm.balanced_accuracy().unwrap() - 2.0 / 3.0).abs() < 1e-10);
    }

    #[test]
    fn label_out_of_range() {
        let err = ConfusionMatrix::from_labels(&[0, 2], &[0, 1], 2).unwrap_err();
        assert!(matches!(err, TreeError::LabelOutOfRange { label: 2, n_classes: 2 }));
    }

    #[test]
    fn empty_labels_error() {
        let err = ConfusionMatrix::from_labels(&[], &[], 2).unwrap_err();
        assert!(matches!(err, TreeError::EmptyDataset));
    }

    #[test]
    fn as_rows_and_display() {
        let cm = ConfusionMatrix::from_labels(&[0, 0, 1, 1], &[0, 1, 0, 1], 2).unwrap();
        assert_eq!(cm.as_rows()[0], vec![1, 1]);
        assert_eq!(cm.as_rows()[1], vec![1, 1]);
        assert_eq!(cm.total(), 4);
        let output = format!("{cm}");
        assert!(output.contains("pred_"));
        assert!(output.contains("true_"));
    }
}
