#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/cohort/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod collector;
pub mod entity;
pub mod error;
pub mod frame;
pub mod selector;

pub use collector::{EntityStats, RankEstimator, StatsCollector, StatsTable, collect_stats};
pub use entity::EntityId;
pub use error::{Result, StatsError};
pub use frame::{CoverageProfile, stats_frame};
pub use selector::{
    DEFAULT_EXPECTED_PERIODS, DEFAULT_MIN_COVERAGE, DEFAULT_N_SELECT, SelectedEntity, Selection,
    SelectionCriteria, SelectionSet, Selector,
};
