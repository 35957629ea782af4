// =================================================================
// data/errors.rs - Error Types
// =================================================================

use thiserror::Error;

/// Error types for building and loading return data
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Returns matrix is empty")]
    Empty,

    #[error("Row {row} has {found} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Non-finite return at row {row}, column {column}")]
    NonFinite { row: usize, column: usize },

    #[error("Label mismatch: {0}")]
    LabelMismatch(String),

    #[error("Data parsing error: {0}")]
    ParseError(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
