//! Coverage filter and top-N selection.

use crate::collector::{EntityStats, StatsTable};
use crate::entity::EntityId;
use crate::error::{Result, StatsError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::info;

/// Default number of entities to select.
pub const DEFAULT_N_SELECT: usize = 100;

/// Default minimum coverage.
pub const DEFAULT_MIN_COVERAGE: f64 = 0.9;

/// Default expected periods per entity: monthly observations over 20 years.
pub const DEFAULT_EXPECTED_PERIODS: u32 = 12 * 20;

/// Parameters of the selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionCriteria {
    /// Maximum number of entities to select
    pub n_select: usize,
    /// Minimum fraction of expected periods an entity must cover, in `[0, 1]`
    pub min_coverage: f64,
    /// Maximum possible observations per entity over the dataset's span
    pub expected_periods: u32,
}

impl Default for SelectionCriteria {
    fn default() -> Self {
        Self {
            n_select: DEFAULT_N_SELECT,
            min_coverage: DEFAULT_MIN_COVERAGE,
            expected_periods: DEFAULT_EXPECTED_PERIODS,
        }
    }
}

impl SelectionCriteria {
    /// Check the parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::InvalidParameter`] if the coverage is outside
    /// `[0, 1]` (or NaN) or the expected period count is zero.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_coverage) {
            return Err(StatsError::InvalidParameter(format!(
                "min coverage must be within [0, 1], got {}",
                self.min_coverage
            )));
        }
        if self.expected_periods == 0 {
            return Err(StatsError::InvalidParameter(
                "expected periods must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether `stats` meets the coverage threshold.
    pub fn qualifies(&self, stats: &EntityStats) -> bool {
        stats.coverage(self.expected_periods) >= self.min_coverage
    }
}

/// One selected entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedEntity {
    /// 1-based position in the ranking
    pub rank: usize,
    /// Entity identifier
    pub entity: EntityId,
    /// Statistics the selection was based on
    pub stats: EntityStats,
    /// Coverage of the expected periods
    pub coverage: f64,
}

/// Outcome of a selection: the ranked entities plus bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    ranked: Vec<SelectedEntity>,
    qualifying: usize,
    criteria: SelectionCriteria,
}

impl Selection {
    /// Selected entities, best first.
    pub fn entities(&self) -> &[SelectedEntity] {
        &self.ranked
    }

    /// Number of selected entities.
    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    /// Whether nothing was selected.
    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    /// Number of entities that met the coverage threshold before truncation.
    pub const fn qualifying(&self) -> usize {
        self.qualifying
    }

    /// Criteria the selection was made with.
    pub const fn criteria(&self) -> &SelectionCriteria {
        &self.criteria
    }

    /// Membership set for the extraction pass.
    pub fn to_set(&self) -> SelectionSet {
        self.ranked.iter().map(|s| s.entity.clone()).collect()
    }
}

/// Immutable set of selected identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet(HashSet<EntityId>);

impl SelectionSet {
    /// Whether `entity` is selected.
    pub fn contains(&self, entity: &str) -> bool {
        self.0.contains(entity)
    }

    /// Number of identifiers in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the identifiers in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &EntityId> {
        self.0.iter()
    }
}

impl FromIterator<EntityId> for SelectionSet {
    fn from_iter<I: IntoIterator<Item = EntityId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Filters and ranks entity statistics.
#[derive(Debug, Clone)]
pub struct Selector {
    criteria: SelectionCriteria,
}

impl Selector {
    /// Create a selector.
    ///
    /// # Errors
    ///
    /// Returns an error if the criteria fail validation.
    pub fn new(criteria: SelectionCriteria) -> Result<Self> {
        criteria.validate()?;
        Ok(Self { criteria })
    }

    /// The selection criteria.
    pub const fn criteria(&self) -> &SelectionCriteria {
        &self.criteria
    }

    /// Select the top entities of `table`.
    ///
    /// Entities meeting the coverage threshold are ordered by rank value
    /// descending, entities without a rank value last, ties broken by
    /// identifier ascending. The first `n_select` are kept.
    pub fn select(&self, table: &StatsTable) -> Selection {
        let criteria = self.criteria;
        let mut qualified: Vec<(&EntityId, &EntityStats)> = table
            .iter()
            .filter(|(_, stats)| criteria.qualifies(stats))
            .collect();
        let qualifying = qualified.len();

        qualified.sort_unstable_by(|a, b| compare_rank(a.1, b.1).then_with(|| a.0.cmp(b.0)));
        qualified.truncate(criteria.n_select);

        let ranked: Vec<SelectedEntity> = qualified
            .into_iter()
            .enumerate()
            .map(|(i, (entity, stats))| SelectedEntity {
                rank: i + 1,
                entity: entity.clone(),
                stats: *stats,
                coverage: stats.coverage(criteria.expected_periods),
            })
            .collect();

        info!(
            entities = table.len(),
            qualifying,
            selected = ranked.len(),
            min_coverage = criteria.min_coverage,
            expected_periods = criteria.expected_periods,
            "selection complete"
        );

        Selection {
            ranked,
            qualifying,
            criteria,
        }
    }
}

/// Orders by rank value descending; missing values sort last.
fn compare_rank(a: &EntityStats, b: &EntityStats) -> Ordering {
    match (a.rank_value, b.rank_value) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
