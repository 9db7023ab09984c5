use tracing::{debug, instrument};

use crate::{
    TreeError,
    entropy::{information_gain, partition, target_entropy},
    node::{AttributeIndex, Node, NodeIndex},
    table::Table,
};

/// Configuration for ID3 tree induction.
///
/// Construct via [`TreeConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter       | Default |
/// |-----------------|---------|
/// | `min_node_size` | 1       |
#[derive(Debug, Clone)]
pub struct TreeConfig {
    pub(crate) min_node_size: usize,
}

impl TreeConfig {
    /// Create a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self { min_node_size: 1 }
    }

    /// Set the node size at or below which a node becomes a leaf.
    ///
    /// A node reached by `n <= min_node_size` rows is not split further.
    #[must_use]
    pub fn with_min_node_size(mut self, min_node_size: usize) -> Self {
        self.min_node_size = min_node_size;
        self
    }

    /// Return the minimum node size.
    #[must_use]
    pub fn min_node_size(&self) -> usize {
        self.min_node_size
    }

    /// Build a decision tree from an encoded table.
    ///
    /// Recursively splits on the attribute with the highest information
    /// gain. A column chosen at a node is excluded for all of its
    /// descendants. A node becomes a leaf, checked in this order, when its
    /// labels are pure, when no attribute column is left, or when it holds
    /// at most `min_node_size` rows.
    ///
    /// # Errors
    ///
    /// | Variant | When |
    /// |---|---|
    /// | [`TreeError::EmptyDataset`] | `table` has no rows |
    /// | [`TreeError::InvalidMinNodeSize`] | `min_node_size` is zero |
    #[instrument(skip(self, table), fields(n_rows = table.n_rows(), n_columns = table.n_columns()))]
    pub fn fit(&self, table: &Table) -> Result<DecisionTree, TreeError> {
        if table.n_rows() == 0 {
            return Err(TreeError::EmptyDataset);
        }
        if self.min_node_size == 0 {
            return Err(TreeError::InvalidMinNodeSize {
                min_node_size: self.min_node_size,
            });
        }

        let rows = table.all_rows();
        let mut excluded = vec![false; table.n_columns()];
        let mut arena: Vec<Node> = Vec::new();

        let root = build_tree(table, &rows, &mut excluded, self, &mut arena);

        debug!(
            root_index = root.index(),
            n_nodes = arena.len(),
            "decision tree built"
        );

        Ok(DecisionTree {
            nodes: arena,
            root,
            n_columns: table.n_columns(),
        })
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Recursively build the subtree for `rows` and return its arena index.
///
/// Children are pushed before their parent, so arena positions follow
/// post-order. `excluded[c]` is set while the subtree below a split on `c`
/// is being built and cleared afterwards.
fn build_tree(
    table: &Table,
    rows: &[usize],
    excluded: &mut [bool],
    config: &TreeConfig,
    arena: &mut Vec<Node>,
) -> NodeIndex {
    let n_samples = rows.len();

    let push_leaf = |arena: &mut Vec<Node>| -> NodeIndex {
        let idx = arena.len();
        arena.push(Node::Leaf {
            class: mean_label(table, rows),
            n_samples,
        });
        NodeIndex::new(idx)
    };

    if target_entropy(table, rows) == 0.0 {
        return push_leaf(arena);
    }

    let candidates: Vec<AttributeIndex> = (0..table.n_columns())
        .filter(|&c| c != Table::LABEL_COLUMN && !excluded[c])
        .map(AttributeIndex::new)
        .collect();
    if candidates.is_empty() {
        return push_leaf(arena);
    }

    if n_samples <= config.min_node_size {
        return push_leaf(arena);
    }

    // Strict comparison: the earliest column wins ties. Starting below zero
    // means a zero-gain attribute is still split on.
    let mut best: Option<(AttributeIndex, f64)> = None;
    let mut best_gain = -1.0;
    for &column in &candidates {
        let gain = information_gain(table, rows, column);
        if gain > best_gain {
            best_gain = gain;
            best = Some((column, gain));
        }
    }
    let Some((attribute, gain)) = best else {
        return push_leaf(arena);
    };

    excluded[attribute.index()] = true;
    let children: Vec<(u32, NodeIndex)> = partition(table, rows, attribute)
        .into_iter()
        .map(|(value, subset)| (value, build_tree(table, &subset, excluded, config, arena)))
        .collect();
    excluded[attribute.index()] = false;

    let idx = arena.len();
    arena.push(Node::Split {
        attribute,
        children,
        gain,
        n_samples,
    });
    NodeIndex::new(idx)
}

/// Mean label over `rows`, rounded half to even (a mean of 0.5 gives 0).
fn mean_label(table: &Table, rows: &[usize]) -> u32 {
    let sum: f64 = rows.iter().map(|&ri| f64::from(table.label(ri))).sum();
    (sum / rows.len() as f64).round_ties_even() as u32
}

/// A fitted ID3 decision tree.
///
/// Stored as an arena-based `Vec<Node>` in post-order; [`root`](Self::root)
/// is the last node.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DecisionTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeIndex,
    pub(crate) n_columns: usize,
}

impl DecisionTree {
    /// Predict the label for a single encoded row (label column included,
    /// its value is ignored).
    ///
    /// At each split the branch matching the row's value is followed. When
    /// the value never reached that split during training, the first child
    /// (smallest observed value) is followed instead; this fallback is part
    /// of the model's behaviour, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::PredictionColumnMismatch`] when `row.len() != n_columns`.
    pub fn predict(&self, row: &[u32]) -> Result<u32, TreeError> {
        if row.len() != self.n_columns {
            return Err(TreeError::PredictionColumnMismatch {
                expected: self.n_columns,
                got: row.len(),
            });
        }
        match &self.nodes[self.traverse(row).index()] {
            Node::Leaf { class, .. } => Ok(*class),
            Node::Split { .. } => unreachable!("traverse always ends at a leaf"),
        }
    }

    /// Predict labels for a batch of rows.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::PredictionColumnMismatch`] if any row has the wrong column count.
    pub fn predict_batch(&self, rows: &[Vec<u32>]) -> Result<Vec<u32>, TreeError> {
        rows.iter().map(|row| self.predict(row)).collect()
    }

    /// Return the root node index.
    #[must_use]
    pub fn root(&self) -> NodeIndex {
        self.root
    }

    /// Return the node at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` does not belong to this tree.
    #[must_use]
    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.nodes[index.index()]
    }

    /// Return all nodes in arena (post-order) order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Return the total number of nodes.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Return the column count (label included) the tree was trained on.
    #[must_use]
    pub fn n_columns(&self) -> usize {
        self.n_columns
    }

    /// Return the maximum depth of the tree. A single leaf has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0usize;
        let mut stack = vec![(self.root, 0usize)];
        while let Some((idx, d)) = stack.pop() {
            match &self.nodes[idx.index()] {
                Node::Leaf { .. } => max_depth = max_depth.max(d),
                Node::Split { children, .. } => {
                    stack.extend(children.iter().map(|&(_, child)| (child, d + 1)));
                }
            }
        }
        max_depth
    }

    /// Walk from the root and return the index of the leaf reached by `row`.
    fn traverse(&self, row: &[u32]) -> NodeIndex {
        let mut idx = self.root;
        loop {
            let node = &self.nodes[idx.index()];
            match node {
                Node::Leaf { .. } => return idx,
                Node::Split {
                    attribute,
                    children,
                    ..
                } => {
                    idx = match node.child(row[attribute.index()]) {
                        Some(child) => child,
                        None => match children.first() {
                            Some(&(_, fallback)) => fallback,
                            None => unreachable!("split nodes always have a child"),
                        },
                    };
                }
            }
        }
    }
}
