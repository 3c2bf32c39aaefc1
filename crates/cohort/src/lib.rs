#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/cohort/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod pipeline;

// Re-export main types from sub-crates
pub use cohort_data as data;
pub use cohort_output as output;
pub use cohort_stats as stats;

pub use config::{ExpectedPeriods, SamplerConfig};
pub use error::{Result, SampleError};
pub use pipeline::{NoProgress, Pass, Progress, Ranking, SampleOutcome, Sampler};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
