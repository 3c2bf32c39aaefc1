#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/cohort/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod block;
pub mod error;
pub mod period;
pub mod schema;

pub use block::{Block, BlockReader, DEFAULT_BLOCK_SIZE, ReadOptions};
pub use error::{DataError, Result};
pub use period::{PeriodSpan, parse_period};
pub use schema::{ColumnNames, MISSING_MARKERS, Record, Schema};

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
