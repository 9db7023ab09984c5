use std::fmt;

/// Zero-based column index into an encoded table.
///
/// Column 0 is always the label; attributes start at 1.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct AttributeIndex(usize);

impl AttributeIndex {
    /// Create a new attribute index from a zero-based column position.
    #[must_use]
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based column index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for AttributeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index into a `Vec<Node>` arena.
///
/// Nodes are pushed in post-order, so the index doubles as the node's
/// identifier in exported graphs: children always carry smaller ids than
/// their parent and the root carries the largest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct NodeIndex(usize);

impl NodeIndex {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based arena index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node in a decision tree arena.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Node {
    /// An interior node branching on one categorical attribute.
    Split {
        /// Column the rows were partitioned on.
        attribute: AttributeIndex,
        /// `(value, child)` pairs in ascending value order. Only values seen
        /// in the rows that reached this node are present; never empty.
        children: Vec<(u32, NodeIndex)>,
        /// Information gain of the chosen attribute at this node.
        gain: f64,
        /// Number of training rows that reached this node.
        n_samples: usize,
    },
    /// A terminal node.
    Leaf {
        /// Predicted label: the mean training label, rounded half to even.
        class: u32,
        /// Number of training rows that reached this node.
        n_samples: usize,
    },
}

impl Node {
    /// Return the number of training rows that reached this node.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        match self {
            Node::Split { n_samples, .. } | Node::Leaf { n_samples, .. } => *n_samples,
        }
    }

    /// Return `true` if this node is a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    /// Return the child reached through the branch labelled `value`, if any.
    ///
    /// Always `None` for leaves.
    #[must_use]
    pub fn child(&self, value: u32) -> Option<NodeIndex> {
        match self {
            Node::Split { children, .. } => children
                .binary_search_by_key(&value, |&(v, _)| v)
                .ok()
                .map(|pos| children[pos].1),
            Node::Leaf { .. } => None,
        }
    }
}
