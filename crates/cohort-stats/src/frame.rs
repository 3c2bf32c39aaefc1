//! Polars views of the statistics table.
//!
//! [`stats_frame`] lays the per-entity statistics out as a `DataFrame` with
//! columns `entity`, `observation_count`, `coverage` and `rank_value`, sorted
//! by identifier. [`CoverageProfile`] summarises the coverage column with lazy
//! expressions.

use crate::collector::{EntityStats, StatsTable};
use crate::entity::EntityId;
use crate::error::Result;
use crate::selector::SelectionCriteria;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Build a `DataFrame` of the statistics, one row per entity.
///
/// # Errors
///
/// Returns an error if polars rejects the columns.
pub fn stats_frame(table: &StatsTable, expected_periods: u32) -> Result<DataFrame> {
    let mut entries: Vec<(&EntityId, &EntityStats)> = table.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let entity: Vec<String> = entries.iter().map(|(id, _)| id.to_string()).collect();
    let observation_count: Vec<u64> = entries.iter().map(|(_, s)| s.observation_count).collect();
    let coverage: Vec<f64> = entries
        .iter()
        .map(|(_, s)| s.coverage(expected_periods))
        .collect();
    let rank_value: Vec<Option<f64>> = entries.iter().map(|(_, s)| s.rank_value).collect();

    let df = DataFrame::new(vec![
        Column::new("entity".into(), entity),
        Column::new("observation_count".into(), observation_count),
        Column::new("coverage".into(), coverage),
        Column::new("rank_value".into(), rank_value),
    ])?;
    Ok(df)
}

/// Distribution of coverage across entities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoverageProfile {
    /// Number of entities
    pub entities: usize,
    /// Mean coverage
    pub mean_coverage: Option<f64>,
    /// Lowest coverage
    pub min_coverage: Option<f64>,
    /// Highest coverage
    pub max_coverage: Option<f64>,
    /// Fraction of entities meeting the threshold
    pub qualifying_share: Option<f64>,
}

impl CoverageProfile {
    /// Profile the `coverage` column of a frame built by [`stats_frame`].
    ///
    /// All statistics are `None` for an empty frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame lacks a `coverage` column.
    pub fn from_frame(frame: &DataFrame, min_coverage: f64) -> Result<Self> {
        let summary = frame
            .clone()
            .lazy()
            .select([
                col("coverage").mean().alias("mean_coverage"),
                col("coverage").min().alias("min_coverage"),
                col("coverage").max().alias("max_coverage"),
                col("coverage")
                    .gt_eq(lit(min_coverage))
                    .cast(DataType::Float64)
                    .mean()
                    .alias("qualifying_share"),
            ])
            .collect()?;

        let value = |name: &str| -> Result<Option<f64>> {
            Ok(summary
                .column(name)?
                .as_materialized_series()
                .f64()?
                .get(0))
        };

        Ok(Self {
            entities: frame.height(),
            mean_coverage: value("mean_coverage")?,
            min_coverage: value("min_coverage")?,
            max_coverage: value("max_coverage")?,
            qualifying_share: value("qualifying_share")?,
        })
    }

    /// Profile `table` under `criteria`.
    ///
    /// # Errors
    ///
    /// Returns an error if the polars computation fails.
    pub fn compute(table: &StatsTable, criteria: &SelectionCriteria) -> Result<Self> {
        let frame = stats_frame(table, criteria.expected_periods)?;
        Self::from_frame(&frame, criteria.min_coverage)
    }
}
