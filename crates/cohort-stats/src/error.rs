//! Error types for statistics and selection.

use thiserror::Error;

/// Result type for statistics operations.
pub type Result<T> = std::result::Result<T, StatsError>;

/// Errors that can occur while collecting statistics or selecting entities.
#[derive(Debug, Error)]
pub enum StatsError {
    /// Reading or decoding the input failed
    #[error("Data error: {0}")]
    Data(#[from] cohort_data::DataError),

    /// Invalid selection parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}
