//! Statistics pass
//!
//! Streams the blocks of a panel file once and accumulates, per entity, the
//! number of observations and the running sum of the ranking attribute. The
//! mean is only formed when the collector is finished, so the result does not
//! depend on how block boundaries split an entity's rows.

use crate::entity::EntityId;
use crate::error::Result;
use cohort_data::{Block, BlockReader, PeriodSpan, Record, Schema, parse_period};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::io::Read;
use tracing::{debug, info, warn};

/// How the per-entity rank value is estimated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankEstimator {
    /// Mean over every record of the entity in the whole input
    #[default]
    GlobalMean,
    /// Mean over the entity's records in the first block it appears in.
    ///
    /// Depends on the block size. Only useful to reproduce samples drawn by
    /// older tooling that fixed the value on first sight.
    FirstBlockMean,
}

impl RankEstimator {
    /// Short name used in reports and on the command line.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::GlobalMean => "global-mean",
            Self::FirstBlockMean => "first-block-mean",
        }
    }
}

/// Finalized statistics for one entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityStats {
    /// Number of records seen for the entity
    pub observation_count: u64,
    /// Mean ranking value, `None` when no record carried a numeric value
    pub rank_value: Option<f64>,
}

impl EntityStats {
    /// Create entity statistics.
    pub const fn new(observation_count: u64, rank_value: Option<f64>) -> Self {
        Self {
            observation_count,
            rank_value,
        }
    }

    /// Fraction of `expected_periods` covered by the entity's observations.
    pub fn coverage(&self, expected_periods: u32) -> f64 {
        self.observation_count as f64 / f64::from(expected_periods)
    }
}

#[derive(Debug, Clone, Copy)]
struct Accumulator {
    observation_count: u64,
    rank_sum: f64,
    rank_count: u64,
    first_block: u64,
    first_block_sum: f64,
    first_block_count: u64,
}

impl Accumulator {
    const fn new(first_block: u64) -> Self {
        Self {
            observation_count: 0,
            rank_sum: 0.0,
            rank_count: 0,
            first_block,
            first_block_sum: 0.0,
            first_block_count: 0,
        }
    }

    fn push(&mut self, block: u64, value: Option<f64>) {
        self.observation_count += 1;
        if let Some(value) = value {
            self.rank_sum += value;
            self.rank_count += 1;
            if block == self.first_block {
                self.first_block_sum += value;
                self.first_block_count += 1;
            }
        }
    }

    fn finish(&self, estimator: RankEstimator) -> EntityStats {
        let (sum, count) = match estimator {
            RankEstimator::GlobalMean => (self.rank_sum, self.rank_count),
            RankEstimator::FirstBlockMean => (self.first_block_sum, self.first_block_count),
        };
        let rank_value = (count > 0).then_some(sum / count as f64);
        EntityStats::new(self.observation_count, rank_value)
    }
}

/// Accumulates per-entity statistics block by block.
#[derive(Debug)]
pub struct StatsCollector {
    estimator: RankEstimator,
    entities: HashMap<EntityId, Accumulator>,
    periods: HashSet<String>,
    period_span: Option<PeriodSpan>,
    blocks_seen: u64,
    rows_seen: u64,
    skipped_rows: u64,
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new(RankEstimator::default())
    }
}

impl StatsCollector {
    /// Create an empty collector.
    pub fn new(estimator: RankEstimator) -> Self {
        Self {
            estimator,
            entities: HashMap::new(),
            periods: HashSet::new(),
            period_span: None,
            blocks_seen: 0,
            rows_seen: 0,
            skipped_rows: 0,
        }
    }

    /// Number of rows seen so far.
    pub const fn rows_seen(&self) -> u64 {
        self.rows_seen
    }

    /// Fold one block into the statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if a ranking field holds non-numeric content. The
    /// collector must then be discarded.
    pub fn observe_block(&mut self, block: &Block, schema: &Schema) -> Result<()> {
        self.blocks_seen += 1;
        let block_id = self.blocks_seen;

        for record in block.rows(schema) {
            self.observe(block_id, &record)?;
        }

        debug!(
            block = block_id,
            rows = block.len(),
            entities = self.entities.len(),
            "folded block into statistics"
        );
        Ok(())
    }

    fn observe(&mut self, block_id: u64, record: &Record<'_>) -> Result<()> {
        self.rows_seen += 1;

        let Some(entity) = record.entity() else {
            self.skipped_rows += 1;
            return Ok(());
        };
        let value = record.rank_value()?;

        if let Some(acc) = self.entities.get_mut(entity) {
            acc.push(block_id, value);
        } else {
            let mut acc = Accumulator::new(block_id);
            acc.push(block_id, value);
            self.entities.insert(EntityId::from(entity), acc);
        }

        if let Some(period) = record.period() {
            if !self.periods.contains(period) {
                self.periods.insert(period.to_string());
            }
            if let Some(date) = parse_period(period) {
                match self.period_span.as_mut() {
                    Some(span) => span.include(date),
                    None => self.period_span = Some(PeriodSpan::at(date)),
                }
            }
        }
        Ok(())
    }

    /// Finalize the statistics.
    pub fn finish(self) -> StatsTable {
        if self.skipped_rows > 0 {
            warn!(
                skipped = self.skipped_rows,
                "rows without an entity identifier were ignored"
            );
        }
        info!(
            entities = self.entities.len(),
            rows = self.rows_seen,
            blocks = self.blocks_seen,
            estimator = self.estimator.name(),
            "statistics pass complete"
        );

        let estimator = self.estimator;
        let entities = self
            .entities
            .into_iter()
            .map(|(id, acc)| (id, acc.finish(estimator)))
            .collect();

        StatsTable {
            entities,
            estimator,
            rows_seen: self.rows_seen,
            skipped_rows: self.skipped_rows,
            blocks_seen: self.blocks_seen,
            distinct_periods: self.periods.len(),
            period_span: self.period_span,
        }
    }
}

/// Run a complete statistics pass over `reader`.
///
/// # Errors
///
/// Returns the first read or decode error; no partial table is produced.
pub fn collect_stats<R: Read>(
    mut reader: BlockReader<R>,
    estimator: RankEstimator,
) -> Result<StatsTable> {
    let mut collector = StatsCollector::new(estimator);
    while let Some(block) = reader.next_block()? {
        collector.observe_block(&block, reader.schema())?;
    }
    Ok(collector.finish())
}

/// Immutable per-entity statistics covering an entire input.
#[derive(Debug, Clone, Default)]
pub struct StatsTable {
    entities: HashMap<EntityId, EntityStats>,
    estimator: RankEstimator,
    rows_seen: u64,
    skipped_rows: u64,
    blocks_seen: u64,
    distinct_periods: usize,
    period_span: Option<PeriodSpan>,
}

impl StatsTable {
    /// Statistics for `entity`, if it was seen.
    pub fn get(&self, entity: &str) -> Option<&EntityStats> {
        self.entities.get(entity)
    }

    /// Number of distinct entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether no entity was seen.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterate over entities in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &EntityStats)> {
        self.entities.iter()
    }

    /// Estimator used for the rank values.
    pub const fn estimator(&self) -> RankEstimator {
        self.estimator
    }

    /// Number of data rows read.
    pub const fn rows_seen(&self) -> u64 {
        self.rows_seen
    }

    /// Rows ignored for lacking an entity identifier.
    pub const fn skipped_rows(&self) -> u64 {
        self.skipped_rows
    }

    /// Number of blocks read.
    pub const fn blocks_seen(&self) -> u64 {
        self.blocks_seen
    }

    /// Number of distinct period values seen (0 when periods were not tracked).
    pub const fn distinct_periods(&self) -> usize {
        self.distinct_periods
    }

    /// Earliest and latest parseable period dates.
    pub const fn period_span(&self) -> Option<PeriodSpan> {
        self.period_span
    }
}

impl FromIterator<(EntityId, EntityStats)> for StatsTable {
    fn from_iter<I: IntoIterator<Item = (EntityId, EntityStats)>>(iter: I) -> Self {
        let entities: HashMap<_, _> = iter.into_iter().collect();
        let rows_seen = entities.values().map(|s| s.observation_count).sum();
        Self {
            entities,
            rows_seen,
            ..Self::default()
        }
    }
}
