//! Export of the ranked selection.
//!
//! Writes the selected entities with the statistics they were chosen on, in
//! CSV or JSON, to a string or a file.

use cohort_stats::{SelectedEntity, Selection};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }

    /// Guess the format from a file extension, defaulting to CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::PrettyJson,
            _ => Self::Csv,
        }
    }
}

/// One row of the selection export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectionRow {
    /// 1-based rank
    pub rank: usize,

    /// Entity identifier.
    pub entity: String,

    /// Number of observations.
    pub observation_count: u64,

    /// Coverage of the expected periods.
    pub coverage: f64,

    /// Mean ranking value.
    pub rank_value: Option<f64>,
}

impl From<&SelectedEntity> for SelectionRow {
    fn from(selected: &SelectedEntity) -> Self {
        Self {
            rank: selected.rank,
            entity: selected.entity.to_string(),
            observation_count: selected.stats.observation_count,
            coverage: selected.coverage,
            rank_value: selected.stats.rank_value,
        }
    }
}

/// Rows of a whole selection, best first.
pub fn selection_rows(selection: &Selection) -> Vec<SelectionRow> {
    selection.entities().iter().map(SelectionRow::from).collect()
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn csv_to_string<T: Serialize>(records: &[T]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in records {
        wtr.serialize(record)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

impl Exporter for [SelectionRow] {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                if self.is_empty() {
                    // serde only emits the header together with the first row
                    return Ok("rank,entity,observation_count,coverage,rank_value\n".to_string());
                }
                csv_to_string(self)
            }
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

impl Exporter for Selection {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        selection_rows(self).export_to_string(format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cohort_stats::{EntityId, EntityStats, SelectionCriteria, Selector, StatsTable};
    use rstest::rstest;

    fn selection() -> Selection {
        let table: StatsTable = [
            (EntityId::from("10107"), EntityStats::new(240, Some(2.5e6))),
            (EntityId::from("14593"), EntityStats::new(230, Some(2.9e6))),
            (EntityId::from("12490"), EntityStats::new(100, Some(9.9e6))),
            (EntityId::from("11850"), EntityStats::new(220, None)),
        ]
        .into_iter()
        .collect();
        Selector::new(SelectionCriteria::default())
            .unwrap()
            .select(&table)
    }

    #[test]
    fn test_selection_rows() {
        let rows = selection_rows(&selection());
        let entities: Vec<&str> = rows.iter().map(|r| r.entity.as_str()).collect();
        assert_eq!(entities, vec!["14593", "10107", "11850"]);
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[2].rank_value, None);
    }

    #[test]
    fn test_selection_export_csv() {
        let csv = selection().export_to_string(ExportFormat::Csv).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("rank,entity,observation_count,coverage,rank_value")
        );
        assert_eq!(lines.next(), Some("1,14593,230,0.9583333333333334,2900000.0"));
        assert_eq!(lines.next(), Some("2,10107,240,1.0,2500000.0"));
        assert_eq!(lines.next(), Some("3,11850,220,0.9166666666666666,"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_empty_selection_csv_has_header() {
        let rows: Vec<SelectionRow> = Vec::new();
        let csv = rows.export_to_string(ExportFormat::Csv).unwrap();
        assert_eq!(csv, "rank,entity,observation_count,coverage,rank_value\n");
    }

    #[test]
    fn test_selection_export_json() {
        let json = selection().export_to_string(ExportFormat::Json).unwrap();
        let parsed: Vec<SelectionRow> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[1].entity, "10107");
        assert!(json.contains("\"rank_value\":null"));
    }

    #[test]
    fn test_selection_export_pretty_json() {
        let json = selection()
            .export_to_string(ExportFormat::PrettyJson)
            .unwrap();
        assert!(json.contains("\"14593\""));
        assert!(json.contains("  ")); // Indentation indicates pretty format
    }

    #[test]
    fn test_export_to_file() {
        let path = std::env::temp_dir().join(format!(
            "cohort_selection_export_{}.csv",
            std::process::id()
        ));

        selection()
            .export_to_file(&path, ExportFormat::Csv)
            .unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("rank,entity"));
        assert!(content.contains("14593"));

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_export_format_extension() {
        assert_eq!(ExportFormat::Csv.extension(), "csv");
        assert_eq!(ExportFormat::Json.extension(), "json");
        assert_eq!(ExportFormat::PrettyJson.extension(), "json");
    }

    #[rstest]
    #[case("report.JSON", ExportFormat::PrettyJson)]
    #[case("out/report.json", ExportFormat::PrettyJson)]
    #[case("report.csv", ExportFormat::Csv)]
    #[case("report", ExportFormat::Csv)]
    fn test_format_from_path(#[case] path: &str, #[case] expected: ExportFormat) {
        assert_eq!(ExportFormat::from_path(Path::new(path)), expected);
    }
}
