use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};

use sylva_io::{CategoryEncoder, ExperimentName, RawDataset, ResultWriter, TableReader};
use sylva_tree::{CrossValidation, DecisionTree, Table, TreeConfig, to_dot};

#[derive(Parser)]
#[command(name = "sylva")]
#[command(about = "ID3 decision trees for categorical data")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for the cross-validation shuffle
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,
}

/// Where the input table lives and how to read it.
#[derive(Args, Debug, Clone)]
struct InputArgs {
    /// Path to the input CSV file
    #[arg(long)]
    data: PathBuf,

    /// Zero-based column holding the class label
    #[arg(long, default_value_t = 0)]
    label_column: usize,

    /// Treat the first line as column names
    #[arg(long, default_value_t = false)]
    has_header: bool,

    /// Field delimiter (single ASCII character)
    #[arg(long, default_value_t = ',')]
    delimiter: char,
}

/// Where artifacts are written.
#[derive(Args, Debug, Clone)]
struct OutputArgs {
    /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
    #[arg(long)]
    experiment: String,

    /// Output directory for result files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Cross-validate an ID3 tree and export the first fold's tree as DOT
    Evaluate {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        output: OutputArgs,

        /// Number of cross-validation folds
        #[arg(long, default_value_t = 10)]
        folds: usize,

        /// Nodes with this many rows or fewer become leaves
        #[arg(long, default_value_t = 1)]
        min_node_size: usize,

        /// Keep the file's row order instead of shuffling before folding
        #[arg(long, default_value_t = false)]
        no_shuffle: bool,
    },

    /// Fit a tree on the whole table and save model, encoder and DOT graph
    Train {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        output: OutputArgs,

        /// Nodes with this many rows or fewer become leaves
        #[arg(long, default_value_t = 1)]
        min_node_size: usize,
    },

    /// Classify the rows of a table with a saved model
    Predict {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        output: OutputArgs,

        /// Path to a model written by `train`
        #[arg(long)]
        model: PathBuf,

        /// Path to the encoder written alongside the model
        #[arg(long)]
        encoder: PathBuf,
    },
}

#[derive(Serialize)]
struct EvaluateOutput {
    experiment: String,
    n_samples: usize,
    n_folds: usize,
    n_classes: usize,
    mean_accuracy: f64,
    std_accuracy: f64,
    mean_balanced_accuracy: Option<f64>,
    tree_path: PathBuf,
}

#[derive(Serialize)]
struct TrainOutput {
    experiment: String,
    n_samples: usize,
    n_nodes: usize,
    n_leaves: usize,
    depth: usize,
    training_accuracy: f64,
    model_path: PathBuf,
}

#[derive(Serialize)]
struct PredictOutput {
    experiment: String,
    n_rows: usize,
    n_known_labels: usize,
    accuracy: Option<f64>,
}

fn read_dataset(input: &InputArgs) -> Result<RawDataset> {
    anyhow::ensure!(
        input.delimiter.is_ascii(),
        "delimiter must be a single ASCII character, got {:?}",
        input.delimiter
    );
    TableReader::new(&input.data)
        .with_has_header(input.has_header)
        .with_label_column(input.label_column)
        .with_delimiter(input.delimiter as u8)
        .read()
        .with_context(|| format!("failed to read {}", input.data.display()))
}

fn encode_table(encoder: &CategoryEncoder, dataset: &RawDataset) -> Result<Table> {
    let rows = encoder.encode(dataset).context("failed to encode dataset")?;
    Table::new(rows).context("encoded dataset is not a valid table")
}

fn open_writer(output: &OutputArgs) -> Result<ResultWriter> {
    let experiment = ExperimentName::new(output.experiment.clone())?;
    Ok(ResultWriter::new(&output.output_dir, experiment)?)
}

fn class_labels(encoder: &CategoryEncoder, n_classes: usize) -> Vec<String> {
    (0..n_classes as u32)
        .map(|c| encoder.decode_label(c).unwrap_or("<unseen>").to_string())
        .collect()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Evaluate {
            input,
            output,
            folds,
            min_node_size,
            no_shuffle,
        } => {
            let writer = open_writer(&output)?;

            // 1. Read and encode
            let dataset = read_dataset(&input)?;
            let encoder = CategoryEncoder::fit(&dataset);
            let table = encode_table(&encoder, &dataset)?;
            info!(
                n_samples = table.n_rows(),
                n_columns = table.n_columns(),
                n_classes = table.n_classes(),
                "table encoded"
            );

            // 2. Cross-validate
            let config = TreeConfig::new().with_min_node_size(min_node_size);
            let cv_result = CrossValidation::new(folds)?
                .with_seed(cli.seed)
                .with_shuffle(!no_shuffle)
                .evaluate(&config, &table)
                .context("cross-validation failed")?;
            info!(
                mean_accuracy = cv_result.mean_accuracy,
                std_accuracy = cv_result.std_accuracy,
                mean_balanced_accuracy = ?cv_result.mean_balanced_accuracy,
                "cross-validation complete"
            );
            debug!("confusion matrix:\n{}", cv_result.confusion_matrix);

            // 3. Export fold-0 tree
            writer.write_tree_dot(&to_dot(&cv_result.first_fold_tree))?;

            // 4. Write evaluation JSON
            let fold_records: Vec<_> = cv_result
                .folds
                .iter()
                .map(|f| {
                    (
                        f.accuracy,
                        f.balanced_accuracy,
                        f.n_train,
                        f.n_validation,
                        f.n_nodes,
                    )
                })
                .collect();
            let class_metrics: Vec<_> = cv_result
                .confusion_matrix
                .class_metrics()
                .iter()
                .map(|m| (m.precision, m.recall, m.support))
                .collect();
            writer.write_evaluation(
                cv_result.n_samples,
                min_node_size,
                &fold_records,
                cv_result.mean_accuracy,
                cv_result.std_accuracy,
                cv_result.mean_balanced_accuracy,
                cv_result.confusion_matrix.as_rows(),
                &class_labels(&encoder, cv_result.n_classes),
                &class_metrics,
            )?;

            // 5. Print summary
            let summary = EvaluateOutput {
                tree_path: writer.tree_path(),
                experiment: output.experiment,
                n_samples: cv_result.n_samples,
                n_folds: cv_result.n_folds,
                n_classes: cv_result.n_classes,
                mean_accuracy: cv_result.mean_accuracy,
                std_accuracy: cv_result.std_accuracy,
                mean_balanced_accuracy: cv_result.mean_balanced_accuracy,
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Command::Train {
            input,
            output,
            min_node_size,
        } => {
            let writer = open_writer(&output)?;

            // 1. Read and encode
            let dataset = read_dataset(&input)?;
            let encoder = CategoryEncoder::fit(&dataset);
            let table = encode_table(&encoder, &dataset)?;

            // 2. Fit on every row
            let tree = TreeConfig::new()
                .with_min_node_size(min_node_size)
                .fit(&table)
                .context("tree induction failed")?;
            let predictions = tree.predict_batch(table.rows())?;
            let correct = predictions
                .iter()
                .zip(table.rows())
                .filter(|(p, row)| **p == row[Table::LABEL_COLUMN])
                .count();
            let training_accuracy = correct as f64 / table.n_rows() as f64;
            info!(
                n_nodes = tree.n_nodes(),
                depth = tree.depth(),
                training_accuracy,
                "tree trained"
            );

            // 3. Save model, encoder and graph
            tree.save(writer.model_path())
                .context("failed to save model")?;
            info!(path = %writer.model_path().display(), "model saved");
            writer.write_encoder(&encoder)?;
            writer.write_tree_dot(&to_dot(&tree))?;

            // 4. Print summary
            let summary = TrainOutput {
                experiment: output.experiment,
                n_samples: table.n_rows(),
                n_nodes: tree.n_nodes(),
                n_leaves: tree.n_leaves(),
                depth: tree.depth(),
                training_accuracy,
                model_path: writer.model_path(),
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Command::Predict {
            input,
            output,
            model,
            encoder,
        } => {
            let writer = open_writer(&output)?;

            // 1. Load model and encoder
            let tree = DecisionTree::load(&model).context("failed to load model")?;
            let encoder = CategoryEncoder::load(&encoder).context("failed to load encoder")?;
            info!(
                n_nodes = tree.n_nodes(),
                n_columns = tree.n_columns(),
                "model loaded"
            );

            // 2. Read and encode with the saved vocabularies
            let dataset = read_dataset(&input)?;
            let rows = encoder.encode(&dataset).context("failed to encode dataset")?;

            // 3. Predict
            let predicted = tree
                .predict_batch(&rows)
                .context("prediction failed")?;

            // 4. Decode and score rows whose label was seen during training
            let mut pairs = Vec::with_capacity(rows.len());
            let mut n_known = 0usize;
            let mut n_correct = 0usize;
            for (row, &class) in rows.iter().zip(&predicted) {
                let actual_code = row[Table::LABEL_COLUMN];
                let actual = encoder.decode_label(actual_code).map(str::to_string);
                if actual.is_some() {
                    n_known += 1;
                    n_correct += usize::from(actual_code == class);
                }
                let predicted_label = encoder
                    .decode_label(class)
                    .with_context(|| format!("model predicted unknown class code {class}"))?;
                pairs.push((predicted_label.to_string(), actual));
            }
            let accuracy = (n_known > 0).then(|| n_correct as f64 / n_known as f64);
            info!(n_rows = rows.len(), n_known, accuracy = ?accuracy, "prediction complete");

            // 5. Write predictions JSON
            writer.write_predictions(&pairs, accuracy)?;

            // 6. Print summary
            let summary = PredictOutput {
                experiment: output.experiment,
                n_rows: rows.len(),
                n_known_labels: n_known,
                accuracy,
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
