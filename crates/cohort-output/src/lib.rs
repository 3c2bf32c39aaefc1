#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/cohort/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod export;
pub mod extract;
pub mod summary;

pub use export::{ExportError, ExportFormat, Exporter, SelectionRow, selection_rows};
pub use extract::{ExtractError, ExtractReport, Extractor, extract};
pub use summary::RunSummary;
