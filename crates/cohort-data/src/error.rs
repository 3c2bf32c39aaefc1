//! Error types for data operations.

use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while reading a panel dataset.
#[derive(Debug, Error)]
pub enum DataError {
    /// Required columns are absent from the header row
    #[error("Missing required columns {missing:?} (available: {available:?})")]
    MissingColumns {
        /// Names of the columns that could not be found
        missing: Vec<String>,
        /// Columns present in the header row
        available: Vec<String>,
    },

    /// A ranking field that is neither numeric nor a missing-value marker
    #[error("Invalid number {value:?} in column {column} at data row {row}")]
    InvalidNumber {
        /// 1-based data row (header excluded)
        row: u64,
        /// Column name
        column: String,
        /// Offending field content
        value: String,
    },

    /// Invalid reader options
    #[error("Invalid read options: {0}")]
    InvalidOptions(String),

    /// Delimited text decoding error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
