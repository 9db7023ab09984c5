//! Contiguous k-fold cross-validation for ID3 trees.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{info, instrument, warn};

use crate::confusion::ConfusionMatrix;
use crate::error::TreeError;
use crate::table::Table;
use crate::tree::{DecisionTree, TreeConfig};

/// Cross-validation configuration.
///
/// Construct via [`CrossValidation::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter | Default |
/// |-----------|---------|
/// | `seed`    | 42      |
/// | `shuffle` | `true`  |
#[derive(Debug, Clone)]
pub struct CrossValidation {
    n_folds: usize,
    seed: u64,
    shuffle: bool,
}

/// Metrics for one held-out fold.
#[derive(Debug, Clone)]
pub struct FoldResult {
    /// Zero-based fold number.
    pub fold: usize,
    /// Proportion of validation rows predicted correctly.
    pub accuracy: f64,
    /// Mean per-class recall; `None` when a class has no validation rows.
    pub balanced_accuracy: Option<f64>,
    /// Number of training rows.
    pub n_train: usize,
    /// Number of validation rows.
    pub n_validation: usize,
    /// Number of nodes in the fold's tree.
    pub n_nodes: usize,
}

/// Results of k-fold cross-validation.
#[derive(Debug)]
pub struct CrossValidationResult {
    /// Per-fold metrics in fold order.
    pub folds: Vec<FoldResult>,
    /// Mean accuracy across folds.
    pub mean_accuracy: f64,
    /// Population standard deviation of fold accuracies.
    pub std_accuracy: f64,
    /// Mean balanced accuracy across folds; `None` if any fold's is undefined.
    pub mean_balanced_accuracy: Option<f64>,
    /// Confusion matrix summed across all folds.
    pub confusion_matrix: ConfusionMatrix,
    /// The tree trained for fold 0, kept for export.
    pub first_fold_tree: DecisionTree,
    /// Number of folds.
    pub n_folds: usize,
    /// Total number of rows.
    pub n_samples: usize,
    /// Number of label classes.
    pub n_classes: usize,
}

impl CrossValidationResult {
    /// Return the accuracy of each fold.
    #[must_use]
    pub fn fold_accuracies(&self) -> Vec<f64> {
        self.folds.iter().map(|f| f.accuracy).collect()
    }
}

impl CrossValidation {
    /// Create a new cross-validation config with the given number of folds.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::InvalidFoldCount`] if `n_folds` < 2.
    pub fn new(n_folds: usize) -> Result<Self, TreeError> {
        if n_folds < 2 {
            return Err(TreeError::InvalidFoldCount { n_folds });
        }
        Ok(Self {
            n_folds,
            seed: 42,
            shuffle: true,
        })
    }

    /// Set the random seed for the row shuffle.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Enable or disable shuffling rows before folding.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Return the number of folds.
    #[must_use]
    pub fn n_folds(&self) -> usize {
        self.n_folds
    }

    /// Return the shuffle seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Return whether rows are shuffled before folding.
    #[must_use]
    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    /// Run k-fold cross-validation.
    ///
    /// Rows are shuffled once (if enabled). With
    /// `fold_size = floor(n / n_folds)`, fold `i` validates on the rows
    /// `[i * fold_size, (i + 1) * fold_size)` and trains on everything
    /// else, prefix then suffix. When `n` is not a multiple of `n_folds`
    /// the trailing rows are only ever used for training.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TreeError::TooFewSamplesForFolds`] | Fewer rows than folds |
    /// | Other tree errors | From underlying training |
    #[instrument(skip_all, fields(n_folds = self.n_folds, n_samples = table.n_rows()))]
    pub fn evaluate(
        &self,
        config: &TreeConfig,
        table: &Table,
    ) -> Result<CrossValidationResult, TreeError> {
        let n_samples = table.n_rows();
        let n_columns = table.n_columns();
        let n_classes = table.n_classes();
        let fold_size = n_samples / self.n_folds;
        if fold_size == 0 {
            return Err(TreeError::TooFewSamplesForFolds {
                n_samples,
                n_folds: self.n_folds,
            });
        }

        let mut rows = table.rows().to_vec();
        if self.shuffle {
            let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
            rows.shuffle(&mut rng);
        }

        let mut folds = Vec::with_capacity(self.n_folds);
        let mut all_true_labels = Vec::new();
        let mut all_predicted = Vec::new();
        let mut first_fold_tree = None;

        for fold in 0..self.n_folds {
            let start = fold * fold_size;
            let end = ((fold + 1) * fold_size).min(n_samples);

            let train_rows: Vec<Vec<u32>> = rows[..start]
                .iter()
                .chain(&rows[end..])
                .cloned()
                .collect();
            let validation = &rows[start..end];
            let train = Table::from_validated(train_rows, n_columns);

            let tree = config.fit(&train)?;
            let predictions = tree.predict_batch(validation)?;
            let true_labels: Vec<u32> = validation
                .iter()
                .map(|row| row[Table::LABEL_COLUMN])
                .collect();

            let matrix = ConfusionMatrix::from_labels(&true_labels, &predictions, n_classes)?;
            let accuracy = matrix.accuracy();
            let balanced_accuracy = match matrix.balanced_accuracy() {
                Ok(value) => Some(value),
                Err(err) => {
                    warn!(fold, %err, "balanced accuracy undefined for fold");
                    None
                }
            };

            info!(
                fold,
                accuracy,
                balanced_accuracy = ?balanced_accuracy,
                n_nodes = tree.n_nodes(),
                "fold completed"
            );

            folds.push(FoldResult {
                fold,
                accuracy,
                balanced_accuracy,
                n_train: train.n_rows(),
                n_validation: validation.len(),
                n_nodes: tree.n_nodes(),
            });
            all_true_labels.extend(true_labels);
            all_predicted.extend(predictions);

            if fold == 0 {
                first_fold_tree = Some(tree);
            }
        }

        let n = self.n_folds as f64;
        let mean_accuracy = folds.iter().map(|f| f.accuracy).sum::<f64>() / n;
        let std_accuracy = {
            let variance = folds
                .iter()
                .map(|f| (f.accuracy - mean_accuracy).powi(2))
                .sum::<f64>()
                / n;
            variance.sqrt()
        };
        let mean_balanced_accuracy = folds
            .iter()
            .map(|f| f.balanced_accuracy)
            .sum::<Option<f64>>()
            .map(|total| total / n);

        let confusion_matrix =
            ConfusionMatrix::from_labels(&all_true_labels, &all_predicted, n_classes)?;

        info!(
            mean_accuracy,
            std_accuracy,
            mean_balanced_accuracy = ?mean_balanced_accuracy,
            "cross-validation complete"
        );

        let Some(first_fold_tree) = first_fold_tree else {
            unreachable!("n_folds >= 2 guarantees a fold 0");
        };

        Ok(CrossValidationResult {
            folds,
            mean_accuracy,
            std_accuracy,
            mean_balanced_accuracy,
            confusion_matrix,
            first_fold_tree,
            n_folds: self.n_folds,
            n_samples,
            n_classes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    fn table(rows: Vec<Vec<u32>>) -> Table {
        Table::new(rows).unwrap()
    }

    #[test]
    fn interleaved_separable_table_scores_perfectly() {
        let t = table(vec![vec![0, 0], vec![1, 1], vec![0, 0], vec![1, 1]]);
        let cv = CrossValidation::new(2).unwrap().with_shuffle(false);
        let result = cv.evaluate(&TreeConfig::new(), &t).unwrap();
        assert!((result.mean_accuracy - 1.0).abs() < f64::EPSILON);
        assert_eq!(result.mean_balanced_accuracy, Some(1.0));
        assert_eq!(result.fold_accuracies(), vec![1.0, 1.0]);
        assert!(result.std_accuracy.abs() < f64::EPSILON);
    }

    #[test]
    fn sorted_table_leaves_each_fold_single_class() {
        // Without shuffling, each training half holds only one label.
        let t = table(vec![vec![0, 0], vec![0, 0], vec![1, 1], vec![1, 1]]);
        let cv = CrossValidation::new(2).unwrap().with_shuffle(false);
        let result = cv.evaluate(&TreeConfig::new(), &t).unwrap();
        assert!(result.mean_accuracy.abs() < f64::EPSILON);
        assert!(result.folds.iter().all(|f| f.balanced_accuracy.is_none()));
        assert_eq!(result.mean_balanced_accuracy, None);
    }

    #[test]
    fn fold_slicing_sizes() {
        // 7 rows, 3 folds: fold_size 2, the last row only ever trains.
        let rows: Vec<Vec<u32>> = (0..7).map(|i| vec![i % 2, i % 3]).collect();
        let cv = CrossValidation::new(3).unwrap().with_shuffle(false);
        let result = cv.evaluate(&TreeConfig::new(), &table(rows)).unwrap();
        assert_eq!(result.folds.len(), 3);
        for fold in &result.folds {
            assert_eq!(fold.n_validation, 2);
            assert_eq!(fold.n_train, 5);
        }
        assert_eq!(result.confusion_matrix.total(), 6);
    }

    #[test]
    fn first_fold_tree_is_kept() {
        let t = table(vec![vec![0, 0], vec![1, 1], vec![0, 0], vec![1, 1]]);
        let cv = CrossValidation::new(2).unwrap().with_shuffle(false);
        let result = cv.evaluate(&TreeConfig::new(), &t).unwrap();
        assert!(matches!(
            result.first_fold_tree.node(result.first_fold_tree.root()),
            Node::Split { .. }
        ));
    }

    #[test]
    fn same_seed_same_result() {
        let rows: Vec<Vec<u32>> = (0..40u32).map(|i| vec![(i * 7) % 2, i % 4, (i / 3) % 3]).collect();
        let t = table(rows);
        let cv = CrossValidation::new(4).unwrap().with_seed(9);
        let a = cv.evaluate(&TreeConfig::new(), &t).unwrap();
        let b = cv.evaluate(&TreeConfig::new(), &t).unwrap();
        assert_eq!(a.fold_accuracies(), b.fold_accuracies());
        assert_eq!(a.first_fold_tree, b.first_fold_tree);
    }

    #[test]
    fn invalid_fold_count() {
        assert!(matches!(
            CrossValidation::new(1),
            Err(TreeError::InvalidFoldCount { n_folds: 1 })
        ));
        assert!(CrossValidation::new(0).is_err());
    }

    #[test]
    fn too_few_samples_for_folds() {
        let t = table(vec![vec![0, 1], vec![1, 2]]);
        let err = CrossValidation::new(3)
            .unwrap()
            .evaluate(&TreeConfig::new(), &t)
            .unwrap_err();
        assert!(matches!(
            err,
            TreeError::TooFewSamplesForFolds { n_samples: 2, n_folds: 3 }
        ));
    }
}
