//! ID3 decision trees over encoded categorical tables: induce, predict,
//! cross-validate, export.
//!
//! Tables carry the label in column 0 and integer-coded categorical
//! attributes in the remaining columns. Trees branch on the attribute with
//! the highest information gain, use each column at most once per path,
//! and are stored as post-order arenas of [`Node`]s.

mod confusion;
pub mod entropy;
mod error;
mod eval;
mod export;
mod node;
mod serialize;
mod table;
mod tree;

pub use confusion::{ClassMetrics, ConfusionMatrix};
pub use error::TreeError;
pub use eval::{CrossValidation, CrossValidationResult, FoldResult};
pub use export::{Dot, to_dot};
pub use node::{AttributeIndex, Node, NodeIndex};
pub use table::Table;
pub use tree::{DecisionTree, TreeConfig};
