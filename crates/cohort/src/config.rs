//! Sampler configuration.
//!
//! Every tunable of a run lives in [`SamplerConfig`]. Defaults follow the
//! usual monthly stock panel: 100 entities, 90% coverage of 240 months,
//! blocks of 100,000 rows.

use crate::error::{Result, SampleError};
use cohort_data::{ColumnNames, DEFAULT_BLOCK_SIZE, ReadOptions};
use cohort_stats::{
    DEFAULT_EXPECTED_PERIODS, DEFAULT_MIN_COVERAGE, DEFAULT_N_SELECT, RankEstimator,
    SelectionCriteria,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Number of periods an entity with full coverage would have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedPeriods {
    /// A fixed count
    Fixed(u32),
    /// The number of distinct period values in the input
    Observed,
}

impl Default for ExpectedPeriods {
    fn default() -> Self {
        Self::Fixed(DEFAULT_EXPECTED_PERIODS)
    }
}

impl ExpectedPeriods {
    /// Resolve to a count given the distinct periods seen in the input.
    ///
    /// An input without any period resolves to one so that the threshold stays
    /// well defined; such an input has no entities to select anyway.
    pub fn resolve(&self, observed: usize) -> u32 {
        match self {
            Self::Fixed(n) => *n,
            Self::Observed => u32::try_from(observed).unwrap_or(u32::MAX).max(1),
        }
    }
}

impl FromStr for ExpectedPeriods {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("observed") {
            return Ok(Self::Observed);
        }
        s.parse::<u32>()
            .map(Self::Fixed)
            .map_err(|_| format!("expected a period count or \"observed\", got {s:?}"))
    }
}

impl fmt::Display for ExpectedPeriods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(n) => write!(f, "{n}"),
            Self::Observed => f.write_str("observed"),
        }
    }
}

/// Configuration of a sampling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Number of entities to select (default: 100)
    pub n_stocks: usize,
    /// Minimum fraction of expected periods covered, in `[0, 1]` (default: 0.9)
    pub min_data_coverage: f64,
    /// Rows per block (default: 100,000)
    pub block_size: usize,
    /// Expected periods per entity (default: 240)
    pub expected_periods: ExpectedPeriods,
    /// Column names
    pub columns: ColumnNames,
    /// Field delimiter, a single ASCII character (default: `,`)
    pub delimiter: char,
    /// Rank value estimator (default: global mean)
    pub rank_estimator: RankEstimator,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            n_stocks: DEFAULT_N_SELECT,
            min_data_coverage: DEFAULT_MIN_COVERAGE,
            block_size: DEFAULT_BLOCK_SIZE,
            expected_periods: ExpectedPeriods::default(),
            columns: ColumnNames::default(),
            delimiter: ',',
            rank_estimator: RankEstimator::default(),
        }
    }
}

impl SamplerConfig {
    /// Load a configuration from a JSON file. Absent fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Check that the configuration describes a runnable job.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_data_coverage) {
            return Err(SampleError::Config(format!(
                "min_data_coverage must be within [0, 1], got {}",
                self.min_data_coverage
            )));
        }
        if self.block_size == 0 {
            return Err(SampleError::Config(
                "block_size must be at least one row".to_string(),
            ));
        }
        if self.expected_periods == ExpectedPeriods::Fixed(0) {
            return Err(SampleError::Config(
                "expected_periods must be positive".to_string(),
            ));
        }
        if !self.delimiter.is_ascii() {
            return Err(SampleError::Config(format!(
                "delimiter must be a single ASCII character, got {:?}",
                self.delimiter
            )));
        }
        if self.columns.entity.trim().is_empty() || self.columns.rank.trim().is_empty() {
            return Err(SampleError::Config(
                "entity and rank column names must not be empty".to_string(),
            ));
        }
        if self.expected_periods == ExpectedPeriods::Observed && self.columns.period.is_none() {
            return Err(SampleError::Config(
                "observed expected periods need a period column".to_string(),
            ));
        }
        Ok(())
    }

    /// Delimiter as a byte.
    pub fn delimiter_byte(&self) -> u8 {
        u8::try_from(self.delimiter).unwrap_or(b',')
    }

    /// Reader options for both passes.
    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            columns: self.columns.clone(),
            block_size: self.block_size,
            delimiter: self.delimiter_byte(),
            require_period: self.expected_periods == ExpectedPeriods::Observed,
        }
    }

    /// Selection criteria, given the distinct periods seen in the input.
    pub fn criteria(&self, observed_periods: usize) -> SelectionCriteria {
        SelectionCriteria {
            n_select: self.n_stocks,
            min_coverage: self.min_data_coverage,
            expected_periods: self.expected_periods.resolve(observed_periods),
        }
    }
}
