//! End-to-end behaviour of tree induction and cross-validation on
//! deterministic synthetic categorical tables.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use sylva_tree::{CrossValidation, Node, Table, TreeConfig};

// ---------------------------------------------------------------------------
// Helper: deterministic synthetic categorical dataset
// ---------------------------------------------------------------------------

/// Generate a 200-row table with a binary label and 5 categorical attributes.
///
/// Column 1 (4 categories) determines the label except for ~5% flipped rows.
/// Columns 2-5 are noise with 3 categories each.
fn make_categorical() -> Table {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let rows = (0..200)
        .map(|_| {
            let signal: u32 = rng.gen_range(0..4);
            let mut label = u32::from(signal >= 2);
            if rng.gen_bool(0.05) {
                label = 1 - label;
            }
            let mut row = vec![label, signal];
            row.extend((0..4).map(|_| rng.gen_range(0..3u32)));
            row
        })
        .collect();
    Table::new(rows).unwrap()
}

#[test]
fn informative_column_is_the_root_split() {
    let tree = TreeConfig::new().fit(&make_categorical()).unwrap();
    match tree.node(tree.root()) {
        Node::Split { attribute, .. } => assert_eq!(attribute.index(), 1),
        Node::Leaf { .. } => panic!("expected a split at the root"),
    }
}

#[test]
fn ten_fold_accuracy_above_threshold() {
    let table = make_categorical();
    let result = CrossValidation::new(10)
        .unwrap()
        .with_seed(42)
        .evaluate(&TreeConfig::new(), &table)
        .unwrap();

    assert_eq!(result.folds.len(), 10);
    assert!(
        result.mean_accuracy > 0.75,
        "mean accuracy {} <= 0.75",
        result.mean_accuracy
    );
    if let Some(balanced) = result.mean_balanced_accuracy {
        assert!(balanced > 0.7, "mean balanced accuracy {balanced} <= 0.7");
    }
}

#[test]
fn every_training_row_predicts() {
    let table = make_categorical();
    let tree = TreeConfig::new().fit(&table).unwrap();
    for row in table.rows() {
        let label = tree.predict(row).unwrap();
        assert!(label <= 1);
    }
}

#[test]
fn larger_min_node_size_gives_smaller_tree() {
    let table = make_categorical();
    let full = TreeConfig::new().fit(&table).unwrap();
    let coarse = TreeConfig::new().with_min_node_size(20).fit(&table).unwrap();
    assert!(coarse.n_nodes() < full.n_nodes());
    assert!(full.depth() <= table.n_columns() - 1);
}

#[test]
fn unseen_validation_value_uses_fallback_child() {
    // Attribute takes value 2 (label 1) and 3 (label 0) in training.
    let table = Table::new(vec![vec![1, 2], vec![1, 2], vec![0, 3], vec![0, 3]]).unwrap();
    let tree = TreeConfig::new().fit(&table).unwrap();
    let predicted = tree.predict(&[0, 5]).unwrap();

    let Node::Split { children, .. } = tree.node(tree.root()) else {
        panic!("expected a split at the root");
    };
    let Node::Leaf { class, .. } = tree.node(children[0].1) else {
        panic!("expected leaf children");
    };
    assert_eq!(predicted, *class);
    assert_eq!(predicted, 1);
}
