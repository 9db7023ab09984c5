//! File I/O, categorical encoding, and artifact writing for sylva.

mod domain;
mod encoder;
mod error;
mod reader;
mod writer;

pub use domain::{ExperimentName, RawDataset};
pub use encoder::CategoryEncoder;
pub use error::IoError;
pub use reader::TableReader;
pub use writer::{ClassRecord, FoldRecord, ResultWriter};
