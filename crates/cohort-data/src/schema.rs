//! Column resolution and row access.
//!
//! A [`Schema`] binds the configured column names to positions in the header
//! row of a panel file. Rows are then read through [`Record`], a borrowed view
//! that knows how to pull the entity identifier, ranking value and period out
//! of the raw fields.

use crate::error::{DataError, Result};
use csv::StringRecord;
use serde::{Deserialize, Serialize};

/// Field contents treated as a missing ranking value.
pub const MISSING_MARKERS: &[&str] = &[
    "", "NA", "N/A", "n/a", "#N/A", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None",
    "<NA>",
];

/// Names of the columns the sampler reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    /// Entity identifier column (default: `permno`)
    pub entity: String,
    /// Ranking attribute column (default: `market_equity`)
    pub rank: String,
    /// Period column (default: `date`); `None` disables period tracking
    pub period: Option<String>,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            entity: "permno".to_string(),
            rank: "market_equity".to_string(),
            period: Some("date".to_string()),
        }
    }
}

/// Column positions resolved against a header row.
#[derive(Debug, Clone)]
pub struct Schema {
    headers: StringRecord,
    names: ColumnNames,
    entity: usize,
    rank: usize,
    period: Option<usize>,
}

impl Schema {
    /// Resolve `names` against `headers`.
    ///
    /// The entity and ranking columns are always required. The period column is
    /// required only when `require_period` is set; otherwise a missing period
    /// column leaves period tracking disabled.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::MissingColumns`] listing every required column that
    /// is not present.
    pub fn resolve(headers: &StringRecord, names: &ColumnNames, require_period: bool) -> Result<Self> {
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);

        let entity = position(&names.entity);
        let rank = position(&names.rank);
        let period = names.period.as_deref().and_then(position);

        let mut missing = Vec::new();
        if entity.is_none() {
            missing.push(names.entity.clone());
        }
        if rank.is_none() {
            missing.push(names.rank.clone());
        }
        if require_period && period.is_none() {
            missing.push(names.period.clone().unwrap_or_else(|| "<period>".to_string()));
        }

        match (entity, rank) {
            (Some(entity), Some(rank)) if missing.is_empty() => Ok(Self {
                headers: headers.clone(),
                names: names.clone(),
                entity,
                rank,
                period,
            }),
            _ => Err(DataError::MissingColumns {
                missing,
                available: headers.iter().map(str::to_string).collect(),
            }),
        }
    }

    /// The header row, as read from the file.
    pub const fn headers(&self) -> &StringRecord {
        &self.headers
    }

    /// Number of columns in the header row.
    pub fn width(&self) -> usize {
        self.headers.len()
    }

    /// The column names this schema was resolved from.
    pub const fn names(&self) -> &ColumnNames {
        &self.names
    }

    /// Whether the period column was found.
    pub const fn tracks_periods(&self) -> bool {
        self.period.is_some()
    }

    /// View a raw row through this schema.
    pub const fn record<'a>(&'a self, row: u64, fields: &'a StringRecord) -> Record<'a> {
        Record {
            schema: self,
            row,
            fields,
        }
    }
}

/// Borrowed view of one data row.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    schema: &'a Schema,
    row: u64,
    fields: &'a StringRecord,
}

impl<'a> Record<'a> {
    /// 1-based data row number (header excluded).
    pub const fn row(&self) -> u64 {
        self.row
    }

    /// All original fields of the row.
    pub const fn fields(&self) -> &'a StringRecord {
        self.fields
    }

    /// Entity identifier, or `None` when the field is empty.
    pub fn entity(&self) -> Option<&'a str> {
        self.fields
            .get(self.schema.entity)
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Period value, or `None` when period tracking is disabled or the field is empty.
    pub fn period(&self) -> Option<&'a str> {
        self.schema
            .period
            .and_then(|idx| self.fields.get(idx))
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    /// Ranking value of the row.
    ///
    /// Missing-value markers and non-finite numbers yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::InvalidNumber`] for any other non-numeric content.
    pub fn rank_value(&self) -> Result<Option<f64>> {
        let raw = self.fields.get(self.schema.rank).unwrap_or("").trim();
        if MISSING_MARKERS.contains(&raw) {
            return Ok(None);
        }
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(Some(value)),
            Ok(_) => Ok(None),
            Err(_) => Err(DataError::InvalidNumber {
                row: self.row,
                column: self.schema.names.rank.clone(),
                value: raw.to_string(),
            }),
        }
    }
}
