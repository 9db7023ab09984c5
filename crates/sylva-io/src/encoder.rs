//! Ordinal encoding of categorical string columns.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::RawDataset;

/// Per-column vocabularies mapping category strings to integer codes.
///
/// The code of a category is its index in the lexicographically sorted list
/// of distinct values seen in that column during [`fit`](Self::fit). A value
/// that was not seen during fitting encodes to `vocabulary.len()`, one past
/// the last known code, so a fitted tree routes it through its fallback
/// branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryEncoder {
    column_names: Vec<String>,
    vocabularies: Vec<Vec<String>>,
}

impl CategoryEncoder {
    /// Learn the sorted vocabulary of every column, label included.
    #[instrument(skip_all, fields(n_rows = dataset.n_rows(), n_columns = dataset.n_columns()))]
    pub fn fit(dataset: &RawDataset) -> Self {
        let vocabularies: Vec<Vec<String>> = (0..dataset.n_columns())
            .map(|col| {
                let distinct: BTreeSet<&str> =
                    dataset.rows().iter().map(|row| row[col].as_str()).collect();
                distinct.into_iter().map(str::to_string).collect()
            })
            .collect();

        debug!(
            sizes = ?vocabularies.iter().map(Vec::len).collect::<Vec<_>>(),
            "vocabularies fitted"
        );

        Self {
            column_names: dataset.column_names().to_vec(),
            vocabularies,
        }
    }

    /// Encode every row of `dataset` into integer codes.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::EncoderColumnMismatch`] if `dataset` does not have
    /// the column count the encoder was fitted on.
    pub fn encode(&self, dataset: &RawDataset) -> Result<Vec<Vec<u32>>, IoError> {
        if dataset.n_columns() != self.n_columns() {
            return Err(IoError::EncoderColumnMismatch {
                expected: self.n_columns(),
                got: dataset.n_columns(),
            });
        }
        Ok(dataset
            .rows()
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&self.vocabularies)
                    .map(|(value, vocab)| encode_value(vocab, value))
                    .collect()
            })
            .collect())
    }

    /// Map a label code back to its category string.
    ///
    /// Returns `None` for codes outside the label vocabulary.
    #[must_use]
    pub fn decode_label(&self, code: u32) -> Option<&str> {
        self.vocabularies
            .first()?
            .get(code as usize)
            .map(String::as_str)
    }

    /// Whether `code` names a label seen during fitting.
    #[must_use]
    pub fn is_known_label(&self, code: u32) -> bool {
        self.decode_label(code).is_some()
    }

    /// Return the column names, label first.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Return the sorted vocabulary of column `col`.
    #[must_use]
    pub fn vocabulary(&self, col: usize) -> Option<&[String]> {
        self.vocabularies.get(col).map(Vec::as_slice)
    }

    /// Return the number of columns, label included.
    #[must_use]
    pub fn n_columns(&self) -> usize {
        self.vocabularies.len()
    }

    /// Load an encoder written by [`ResultWriter::write_encoder`](crate::ResultWriter::write_encoder).
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
    /// | [`IoError::Json`] | Contents are not a valid encoder document |
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, IoError> {
        let json = fs::read_to_string(path).map_err(|e| IoError::FileNotFound {
            path: path.to_path_buf(),
            source: e,
        })?;
        let encoder: Self = serde_json::from_str(&json).map_err(|e| IoError::Json {
            path: path.to_path_buf(),
            source: e,
        })?;
        info!(n_columns = encoder.n_columns(), "encoder loaded");
        Ok(encoder)
    }
}

fn encode_value(vocab: &[String], value: &str) -> u32 {
    let code = vocab
        .binary_search_by(|known| known.as_str().cmp(value))
        .unwrap_or(vocab.len());
    code as u32
}
