//! Encoded categorical table with the label in column 0.

use crate::entropy;
use crate::error::TreeError;
use crate::node::AttributeIndex;

/// A row-major table of non-negative integer codes.
///
/// Column 0 holds the label; every other column is a categorical attribute
/// whose codes need not be contiguous or ordered. All rows share the same
/// column count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    rows: Vec<Vec<u32>>,
    n_columns: usize,
}

impl Table {
    /// Index of the label column.
    pub const LABEL_COLUMN: usize = 0;

    /// Build a table from encoded rows.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TreeError::EmptyDataset`] | `rows` is empty |
    /// | [`TreeError::MissingLabelColumn`] | rows have zero columns |
    /// | [`TreeError::RowLengthMismatch`] | rows have inconsistent lengths |
    pub fn new(rows: Vec<Vec<u32>>) -> Result<Self, TreeError> {
        let n_columns = rows.first().map(Vec::len).ok_or(TreeError::EmptyDataset)?;
        if n_columns == 0 {
            return Err(TreeError::MissingLabelColumn);
        }
        if let Some((row_index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != n_columns)
        {
            return Err(TreeError::RowLengthMismatch {
                expected: n_columns,
                got: row.len(),
                row_index,
            });
        }
        Ok(Self { rows, n_columns })
    }

    /// Build a table from rows already known to be rectangular.
    pub(crate) fn from_validated(rows: Vec<Vec<u32>>, n_columns: usize) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == n_columns));
        Self { rows, n_columns }
    }

    /// Return the rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<u32>] {
        &self.rows
    }

    /// Return the number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Return the number of columns, label included.
    #[must_use]
    pub fn n_columns(&self) -> usize {
        self.n_columns
    }

    /// Return the label of the row at `row_index`.
    #[must_use]
    pub fn label(&self, row_index: usize) -> u32 {
        self.rows[row_index][Self::LABEL_COLUMN]
    }

    /// Return the number of label classes, `max(label) + 1`, never below 2.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        let max = self
            .rows
            .iter()
            .map(|row| row[Self::LABEL_COLUMN])
            .max()
            .unwrap_or(0);
        (max as usize + 1).max(2)
    }

    /// Entropy of the label distribution over every row.
    #[must_use]
    pub fn target_entropy(&self) -> f64 {
        entropy::target_entropy(self, &self.all_rows())
    }

    /// Information gain of partitioning every row on `column`.
    #[must_use]
    pub fn information_gain(&self, column: AttributeIndex) -> f64 {
        entropy::information_gain(self, &self.all_rows(), column)
    }

    pub(crate) fn all_rows(&self) -> Vec<usize> {
        (0..self.rows.len()).collect()
    }
}
