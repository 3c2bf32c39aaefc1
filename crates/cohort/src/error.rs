//! Error type for sampling runs.

use thiserror::Error;

/// Result type for sampling runs.
pub type Result<T> = std::result::Result<T, SampleError>;

/// Errors that can end a sampling run.
#[derive(Debug, Error)]
pub enum SampleError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Reading the input failed
    #[error(transparent)]
    Data(#[from] cohort_data::DataError),

    /// Statistics or selection failed
    #[error(transparent)]
    Stats(#[from] cohort_stats::StatsError),

    /// Extraction failed
    #[error(transparent)]
    Extract(#[from] cohort_output::ExtractError),

    /// Configuration file could not be parsed
    #[error("Configuration parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
