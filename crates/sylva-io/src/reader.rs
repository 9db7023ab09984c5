//! CSV reader for categorical tables.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::RawDataset;

/// Reads a delimited file of categorical strings.
///
/// Every cell is kept as a trimmed string; encoding to integer codes is the
/// job of [`CategoryEncoder`](crate::CategoryEncoder). The designated label
/// column is moved to position 0, the remaining columns keep their relative
/// order.
///
/// When the file has no header, columns are named `column_{i}` after their
/// position in the file.
///
/// # Defaults
///
/// | Parameter | Default |
/// |---|---|
/// | `has_header` | `false` |
/// | `label_column` | 0 |
/// | `delimiter` | `b','` |
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::EmptyDataset`] | Zero data rows |
/// | [`IoError::InconsistentRowLength`] | Row has a different column count than the first |
/// | [`IoError::LabelColumnOutOfRange`] | `label_column >= n_columns` |
#[derive(Debug, Clone)]
pub struct TableReader {
    path: PathBuf,
    has_header: bool,
    label_column: usize,
    delimiter: u8,
}

impl TableReader {
    /// Create a new reader for the given file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            has_header: false,
            label_column: 0,
            delimiter: b',',
        }
    }

    /// Treat the first record as column names.
    #[must_use]
    pub fn with_has_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Set the zero-based column holding the class label.
    #[must_use]
    pub fn with_label_column(mut self, label_column: usize) -> Self {
        self.label_column = label_column;
        self
    }

    /// Set the field delimiter.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Read and validate the file, returning a [`RawDataset`] with the label first.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<RawDataset, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) so that short rows surface as InconsistentRowLength
        // rather than as a CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(self.has_header)
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(file);

        let header: Option<Vec<String>> = if self.has_header {
            let record = rdr.headers().map_err(|e| self.csv_error(e))?;
            Some(record.iter().map(str::to_string).collect())
        } else {
            None
        };

        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut expected = header.as_ref().map(Vec::len);

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;
            let width = *expected.get_or_insert(record.len());
            if record.len() != width {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: width,
                    got: record.len(),
                });
            }
            rows.push(record.iter().map(str::to_string).collect());
        }

        let Some(n_columns) = expected.filter(|_| !rows.is_empty()) else {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        };
        debug!(n_columns, "column count fixed");

        if self.label_column >= n_columns {
            return Err(IoError::LabelColumnOutOfRange {
                path: self.path.clone(),
                label_column: self.label_column,
                n_columns,
            });
        }

        let mut column_names = header
            .unwrap_or_else(|| (0..n_columns).map(|i| format!("column_{i}")).collect());

        if self.label_column != 0 {
            move_to_front(&mut column_names, self.label_column);
            for row in &mut rows {
                move_to_front(row, self.label_column);
            }
        }

        info!(
            n_rows = rows.len(),
            n_columns,
            label = %column_names[0],
            "dataset loaded"
        );

        Ok(RawDataset::new(column_names, rows))
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}

/// Move `values[index]` to position 0, shifting `values[..index]` right by one.
fn move_to_front<T>(values: &mut [T], index: usize) {
    values[..=index].rotate_right(1);
}
