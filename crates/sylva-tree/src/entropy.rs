//! Shannon entropy and information gain over subsets of a [`Table`].
//!
//! Subsets are passed as row indices into the table so the builder can
//! recurse without copying rows.

use std::collections::BTreeMap;

use crate::node::AttributeIndex;
use crate::table::Table;

/// Shannon entropy `-Σ p·ln(p)` of a distribution given as raw counts.
///
/// Zero counts contribute nothing. Returns `0.0` when every count is zero;
/// the builder never asks for the entropy of an empty row set.
#[must_use]
pub fn entropy(counts: &[usize]) -> f64 {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    -counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / n;
            p * p.ln()
        })
        .sum::<f64>()
}

/// Entropy of the label distribution over `rows`.
#[must_use]
pub fn target_entropy(table: &Table, rows: &[usize]) -> f64 {
    entropy(&label_counts(table, rows))
}

/// Information gain of partitioning `rows` on `column`:
/// `H(rows) - Σ_v |rows_v| / |rows| · H(rows_v)`.
///
/// Never negative apart from floating-point rounding.
#[must_use]
pub fn information_gain(table: &Table, rows: &[usize], column: AttributeIndex) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let n = rows.len() as f64;
    let conditional: f64 = partition(table, rows, column)
        .values()
        .map(|subset| subset.len() as f64 / n * target_entropy(table, subset))
        .sum();
    target_entropy(table, rows) - conditional
}

/// Group `rows` by their value in `column`, in ascending value order.
///
/// Every row lands in exactly one group and keeps its relative order.
pub(crate) fn partition(
    table: &Table,
    rows: &[usize],
    column: AttributeIndex,
) -> BTreeMap<u32, Vec<usize>> {
    let mut groups: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for &ri in rows {
        groups
            .entry(table.rows()[ri][column.index()])
            .or_default()
            .push(ri);
    }
    groups
}

/// Per-label counts over `rows`, in ascending label order.
fn label_counts(table: &Table, rows: &[usize]) -> Vec<usize> {
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for &ri in rows {
        *counts.entry(table.label(ri)).or_default() += 1;
    }
    counts.into_values().collect()
}
