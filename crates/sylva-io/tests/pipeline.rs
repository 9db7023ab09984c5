//! End-to-end integration tests: CSV -> encode -> fit/evaluate -> artifacts -> reload.

use std::fs;
use std::path::{Path, PathBuf};

use sylva_io::{CategoryEncoder, ExperimentName, ResultWriter, TableReader};
use sylva_tree::{CrossValidation, DecisionTree, Node, Table, TreeConfig, to_dot};
use tempfile::TempDir;

/// Path to the test fixture directory.
fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

fn load_fixture() -> (CategoryEncoder, Table) {
    let dataset = TableReader::new(&fixture_path("recurrence_16.csv"))
        .read()
        .expect("fixture should parse");
    assert_eq!(dataset.n_rows(), 16);
    assert_eq!(dataset.n_columns(), 6);

    let encoder = CategoryEncoder::fit(&dataset);
    let table = Table::new(encoder.encode(&dataset).unwrap()).unwrap();
    (encoder, table)
}

#[test]
fn fit_splits_on_malignancy_degree() {
    let (encoder, table) = load_fixture();
    assert_eq!(encoder.decode_label(0), Some("no-recurrence-events"));
    assert_eq!(encoder.vocabulary(4).unwrap(), &["1", "2", "3"]);

    let tree = TreeConfig::new().fit(&table).unwrap();
    let Node::Split {
        attribute,
        children,
        ..
    } = tree.node(tree.root())
    else {
        panic!("expected a split at the root");
    };
    assert_eq!(attribute.index(), 4);
    assert_eq!(children.len(), 3);
    assert_eq!(tree.n_nodes(), 4);

    let predictions = tree.predict_batch(table.rows()).unwrap();
    for (row, predicted) in table.rows().iter().zip(predictions) {
        assert_eq!(predicted, row[0]);
    }
}

#[test]
fn evaluate_writes_artifacts() {
    let (encoder, table) = load_fixture();
    let config = TreeConfig::new();
    let result = CrossValidation::new(4)
        .unwrap()
        .with_seed(42)
        .evaluate(&config, &table)
        .unwrap();

    let dir = TempDir::new().unwrap();
    let experiment = ExperimentName::new("cv_rt".into()).unwrap();
    let writer = ResultWriter::new(dir.path(), experiment).unwrap();

    writer
        .write_tree_dot(&to_dot(&result.first_fold_tree))
        .unwrap();

    let folds: Vec<_> = result
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
    let class_labels: Vec<String> = (0..result.n_classes as u32)
        .map(|c| encoder.decode_label(c).unwrap_or("?").to_string())
        .collect();
    let class_metrics: Vec<_> = result
        .confusion_matrix
        .class_metrics()
        .iter()
        .map(|m| (m.precision, m.recall, m.support))
        .collect();
    writer
        .write_evaluation(
            result.n_samples,
            config.min_node_size(),
            &folds,
            result.mean_accuracy,
            result.std_accuracy,
            result.mean_balanced_accuracy,
            result.confusion_matrix.as_rows(),
            &class_labels,
            &class_metrics,
        )
        .unwrap();

    let dot = fs::read_to_string(dir.path().join("cv_rt_tree.dot")).unwrap();
    assert!(dot.starts_with("digraph{\n"));
    assert!(dot.ends_with('}'));

    let content = read_json(&dir.path().join("cv_rt_evaluate.json"));
    assert_eq!(content["experiment"], "cv_rt");
    assert_eq!(content["n_samples"], 16);
    assert_eq!(content["n_folds"], 4);
    assert_eq!(content["folds"].as_array().unwrap().len(), 4);
    for fold in content["folds"].as_array().unwrap() {
        assert_eq!(fold["n_validation"], 4);
        assert_eq!(fold["n_train"], 12);
        let accuracy = fold["accuracy"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&accuracy));
    }
    assert_eq!(content["class_metrics"][0]["label"], "no-recurrence-events");
    assert_eq!(content["class_metrics"][1]["label"], "recurrence-events");
}

#[test]
fn train_then_predict_round_trip() {
    let (encoder, table) = load_fixture();
    let tree = TreeConfig::new().fit(&table).unwrap();

    let dir = TempDir::new().unwrap();
    let experiment = ExperimentName::new("model_rt".into()).unwrap();
    let writer = ResultWriter::new(dir.path(), experiment).unwrap();
    tree.save(writer.model_path()).unwrap();
    writer.write_encoder(&encoder).unwrap();

    let loaded_tree = DecisionTree::load(writer.model_path()).unwrap();
    let loaded_encoder = CategoryEncoder::load(&writer.encoder_path()).unwrap();
    assert_eq!(loaded_tree, tree);
    assert_eq!(loaded_encoder, encoder);

    // Age and tumor-size categories that never appear in the fixture.
    let unseen = dir.path().join("unseen.csv");
    fs::write(&unseen, "recurrence-events,90-99,premeno,50-54,3,left\n").unwrap();
    let dataset = TableReader::new(&unseen).read().unwrap();
    let rows = loaded_encoder.encode(&dataset).unwrap();
    assert_eq!(rows[0][1], 4);

    let predicted = loaded_tree.predict_batch(&rows).unwrap();
    let pairs: Vec<(String, Option<String>)> = predicted
        .iter()
        .zip(&rows)
        .map(|(&p, row)| {
            (
                loaded_encoder.decode_label(p).unwrap().to_string(),
                loaded_encoder.decode_label(row[0]).map(str::to_string),
            )
        })
        .collect();
    assert_eq!(pairs[0].0, "recurrence-events");

    writer.write_predictions(&pairs, Some(1.0)).unwrap();
    let content = read_json(&dir.path().join("model_rt_predict.json"));
    assert_eq!(content["predictions"][0]["predicted"], "recurrence-events");
    assert_eq!(content["predictions"][0]["actual"], "recurrence-events");
}
