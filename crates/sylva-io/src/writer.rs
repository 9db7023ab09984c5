//! Writers for tree, evaluation, encoder and prediction artifacts.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::ExperimentName;
use crate::encoder::CategoryEncoder;

/// Per-fold metrics as passed to [`ResultWriter::write_evaluation`]:
/// `(accuracy, balanced_accuracy, n_train, n_validation, n_nodes)`.
pub type FoldRecord = (f64, Option<f64>, usize, usize, usize);

/// Per-class metrics as passed to [`ResultWriter::write_evaluation`]:
/// `(precision, recall, support)`.
pub type ClassRecord = (f64, Option<f64>, usize);

/// Writes experiment artifacts into one output directory.
///
/// Creates the output directory on construction if it does not exist.
/// Files are named after the experiment:
///
/// | File | Contents |
/// |---|---|
/// | `{experiment}_tree.dot` | Graphviz rendering of a tree |
/// | `{experiment}_evaluate.json` | Cross-validation metrics |
/// | `{experiment}_encoder.json` | Category vocabularies |
/// | `{experiment}_predict.json` | Per-row predictions |
/// | `{experiment}_model.bin` | Fitted tree (written by the model itself) |
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Write DOT text to `{experiment}_tree.dot`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_tree_dot(&self, dot: &str) -> Result<(), IoError> {
        let path = self.tree_path();
        write_file(&path, dot)?;
        info!(path = %path.display(), "tree graph written");
        Ok(())
    }

    /// Write cross-validation results to `{experiment}_evaluate.json`.
    ///
    /// Takes primitives so that this crate does not depend on `sylva-tree`.
    /// `class_labels[i]` is the decoded name of class `i`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::Json`] | Serialization fails |
    /// | [`IoError::WriteFile`] | The file cannot be written |
    #[allow(clippy::too_many_arguments)]
    #[instrument(skip_all)]
    pub fn write_evaluation(
        &self,
        n_samples: usize,
        min_node_size: usize,
        folds: &[FoldRecord],
        mean_accuracy: f64,
        std_accuracy: f64,
        mean_balanced_accuracy: Option<f64>,
        confusion_matrix: &[Vec<usize>],
        class_labels: &[String],
        class_metrics: &[ClassRecord],
    ) -> Result<(), IoError> {
        let path = self.artifact_path("evaluate.json");

        let fold_entries: Vec<FoldEntry> = folds
            .iter()
            .enumerate()
            .map(
                |(fold, &(accuracy, balanced_accuracy, n_train, n_validation, n_nodes))| {
                    FoldEntry {
                        fold,
                        accuracy,
                        balanced_accuracy,
                        n_train,
                        n_validation,
                        n_nodes,
                    }
                },
            )
            .collect();

        let classes: Vec<ClassEntry> = class_metrics
            .iter()
            .enumerate()
            .map(|(i, &(precision, recall, support))| ClassEntry {
                class: i,
                label: class_labels.get(i).map(String::as_str),
                precision,
                recall,
                support,
            })
            .collect();

        let artifact = EvaluateArtifact {
            experiment: self.experiment.as_str(),
            n_samples,
            n_folds: folds.len(),
            n_classes: class_metrics.len(),
            min_node_size,
            mean_accuracy,
            std_accuracy,
            mean_balanced_accuracy,
            folds: fold_entries,
            confusion_matrix,
            class_metrics: classes,
        };

        self.write_json(&path, &artifact)?;
        info!(path = %path.display(), "evaluation result written");
        Ok(())
    }

    /// Write category vocabularies to `{experiment}_encoder.json`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::Json`] | Serialization fails |
    /// | [`IoError::WriteFile`] | The file cannot be written |
    #[instrument(skip_all)]
    pub fn write_encoder(&self, encoder: &CategoryEncoder) -> Result<(), IoError> {
        let path = self.encoder_path();
        self.write_json(&path, encoder)?;
        info!(path = %path.display(), "encoder written");
        Ok(())
    }

    /// Write predictions to `{experiment}_predict.json`.
    ///
    /// Each entry is a `(predicted, actual)` label pair in row order;
    /// `actual` is `None` when the row's label was not seen during training.
    /// `accuracy` covers only the rows with a known label.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::Json`] | Serialization fails |
    /// | [`IoError::WriteFile`] | The file cannot be written |
    #[instrument(skip_all)]
    pub fn write_predictions(
        &self,
        predictions: &[(String, Option<String>)],
        accuracy: Option<f64>,
    ) -> Result<(), IoError> {
        let path = self.artifact_path("predict.json");

        let entries: Vec<PredictionEntry> = predictions
            .iter()
            .enumerate()
            .map(|(row, (predicted, actual))| PredictionEntry {
                row,
                predicted: predicted.as_str(),
                actual: actual.as_deref(),
            })
            .collect();

        let artifact = PredictArtifact {
            experiment: self.experiment.as_str(),
            n_rows: predictions.len(),
            accuracy,
            predictions: entries,
        };

        self.write_json(&path, &artifact)?;
        info!(path = %path.display(), "predictions written");
        Ok(())
    }

    /// Return the path of `{experiment}_tree.dot`.
    #[must_use]
    pub fn tree_path(&self) -> PathBuf {
        self.artifact_path("tree.dot")
    }

    /// Return the path of `{experiment}_encoder.json`.
    #[must_use]
    pub fn encoder_path(&self) -> PathBuf {
        self.artifact_path("encoder.json")
    }

    /// Return the path where the model binary should be saved.
    ///
    /// Does not write anything, only computes `{output_dir}/{experiment}_model.bin`.
    #[must_use]
    pub fn model_path(&self) -> PathBuf {
        self.artifact_path("model.bin")
    }

    fn artifact_path(&self, suffix: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{suffix}", self.experiment.as_str()))
    }

    fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(value).map_err(|e| IoError::Json {
            path: path.to_path_buf(),
            source: e,
        })?;
        write_file(path, &json)
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), IoError> {
    fs::write(path, contents).map_err(|e| IoError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct EvaluateArtifact<'a> {
    experiment: &'a str,
    n_samples: usize,
    n_folds: usize,
    n_classes: usize,
    min_node_size: usize,
    mean_accuracy: f64,
    std_accuracy: f64,
    mean_balanced_accuracy: Option<f64>,
    folds: Vec<FoldEntry>,
    confusion_matrix: &'a [Vec<usize>],
    class_metrics: Vec<ClassEntry<'a>>,
}

#[derive(Serialize)]
struct FoldEntry {
    fold: usize,
    accuracy: f64,
    balanced_accuracy: Option<f64>,
    n_train: usize,
    n_validation: usize,
    n_nodes: usize,
}

#[derive(Serialize)]
struct ClassEntry<'a> {
    class: usize,
    label: Option<&'a str>,
    precision: f64,
    recall: Option<f64>,
    support: usize,
}

#[derive(Serialize)]
struct PredictArtifact<'a> {
    experiment: &'a str,
    n_rows: usize,
    accuracy: Option<f64>,
    predictions: Vec<PredictionEntry<'a>>,
}

#[derive(Serialize)]
struct PredictionEntry<'a> {
    row: usize,
    predicted: &'a str,
    actual: Option<&'a str>,
}
