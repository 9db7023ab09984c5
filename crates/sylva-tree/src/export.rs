//! Graphviz DOT rendering of a fitted tree.

use std::fmt;

use crate::node::{Node, NodeIndex};
use crate::tree::DecisionTree;

/// Display adapter that renders a [`DecisionTree`] as a DOT digraph.
///
/// Each node becomes `<id>[label=<attribute-or-class>];` and each branch
/// `<parent> -> <child> [label="<value>"];`. Statements are emitted in
/// pre-order: a node, then for every child in branch order its edge
/// followed by the child's subtree.
pub struct Dot<'a>(pub &'a DecisionTree);

impl fmt::Display for Dot<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "digraph{{")?;
        write_subtree(self.0, self.0.root(), f)?;
        write!(f, "}}")
    }
}

fn write_subtree(tree: &DecisionTree, idx: NodeIndex, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match tree.node(idx) {
        Node::Leaf { class, .. } => writeln!(f, "{idx}[label={class}];"),
        Node::Split {
            attribute,
            children,
            ..
        } => {
            writeln!(f, "{idx}[label={attribute}];")?;
            for &(value, child) in children {
                writeln!(f, "{idx} -> {child} [label=\"{value}\"];")?;
                write_subtree(tree, child, f)?;
            }
            Ok(())
        }
    }
}

/// Render `tree` as DOT text.
#[must_use]
pub fn to_dot(tree: &DecisionTree) -> String {
    Dot(tree).to_string()
}
