use std::path::PathBuf;

/// Errors from tree induction, prediction, evaluation, and model persistence.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// Returned when a table or label set has zero rows.
    #[error("dataset has zero rows")]
    EmptyDataset,

    /// Returned when rows have zero columns, so there is no label column.
    #[error("rows have zero columns; column 0 must hold the label")]
    MissingLabelColumn,

    /// Returned when a row has a different number of columns than the first row.
    #[error("row {row_index} has {got} columns, expected {expected}")]
    RowLengthMismatch {
        /// The column count of the first row.
        expected: usize,
        /// The column count of the offending row.
        got: usize,
        /// The zero-based index of the offending row.
        row_index: usize,
    },

    /// Returned when the minimum node size is zero.
    #[error("min_node_size must be at least 1, got {min_node_size}")]
    InvalidMinNodeSize {
        /// The invalid value provided.
        min_node_size: usize,
    },

    /// Returned when n_folds is less than 2.
    #[error("n_folds must be at least 2, got {n_folds}")]
    InvalidFoldCount {
        /// The invalid n_folds value provided.
        n_folds: usize,
    },

    /// Returned when the dataset is too small to give every fold a validation row.
    #[error("{n_samples} rows cannot be split into {n_folds} non-empty folds")]
    TooFewSamplesForFolds {
        /// Number of rows in the dataset.
        n_samples: usize,
        /// The requested number of folds.
        n_folds: usize,
    },

    /// Returned when a row passed to prediction has the wrong column count.
    #[error("prediction input has {got} columns, expected {expected}")]
    PredictionColumnMismatch {
        /// The column count the tree was trained on.
        expected: usize,
        /// The column count of the prediction input.
        got: usize,
    },

    /// Returned when a label falls outside the class range of a confusion matrix.
    #[error("label {label} is outside the class range 0..{n_classes}")]
    LabelOutOfRange {
        /// The offending label.
        label: u32,
        /// Number of classes the matrix was built for.
        n_classes: usize,
    },

    /// Returned when balanced accuracy is requested but a class has no true samples,
    /// so its recall (and the average of recalls) is undefined.
    #[error("balanced accuracy is undefined: class {class} has no validation rows")]
    UndefinedBalancedAccuracy {
        /// The class with zero support.
        class: u32,
    },

    /// Returned when model serialization fails.
    #[error("failed to serialize model")]
    SerializeModel {
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when model deserialization fails.
    #[error("failed to deserialize model from {path}")]
    DeserializeModel {
        /// Path to the model file that could not be deserialized.
        path: PathBuf,
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when writing the model file fails.
    #[error("failed to write model to {path}")]
    WriteModel {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when reading the model file fails.
    #[error("failed to read model from {path}")]
    ReadModel {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when loading a model with an incompatible format version.
    #[error("incompatible model version in {path}: expected {expected}, found {found}")]
    IncompatibleModelVersion {
        /// The model format version this build expects.
        expected: u32,
        /// The model format version found in the file.
        found: u32,
        /// Path to the model file with the incompatible version.
        path: PathBuf,
    },
}
