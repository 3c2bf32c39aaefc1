//! Run summary.
//!
//! Collects the figures of a sampling run (input size, coverage, selection
//! and output shape) and renders them for humans.

use crate::export::{ExportError, ExportFormat, Exporter};
use crate::extract::ExtractReport;
use cohort_data::PeriodSpan;
use cohort_stats::{CoverageProfile, Selection, SelectionCriteria, StatsTable};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Figures describing one sampling run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    /// Input file
    pub input: String,
    /// Output file, if the extraction pass ran
    pub output: Option<String>,
    /// Rank estimator name
    pub estimator: String,
    /// Selection parameters
    pub criteria: SelectionCriteria,
    /// Data rows read in the statistics pass
    pub rows_scanned: u64,
    /// Rows ignored for lacking an entity identifier
    pub skipped_rows: u64,
    /// Distinct entities seen
    pub entities: usize,
    /// Entities meeting the coverage threshold
    pub qualifying: usize,
    /// Entities selected
    pub selected: usize,
    /// Distinct period values seen
    pub distinct_periods: usize,
    /// Earliest and latest parseable period dates
    pub period_span: Option<PeriodSpan>,
    /// Coverage distribution
    pub coverage: Option<CoverageProfile>,
    /// Output rows (header excluded)
    pub output_rows: Option<u64>,
    /// Output columns
    pub output_columns: Option<usize>,
}

impl RunSummary {
    /// Summarise the statistics pass and the selection.
    pub fn new(input: impl Into<String>, table: &StatsTable, selection: &Selection) -> Self {
        Self {
            input: input.into(),
            output: None,
            estimator: table.estimator().name().to_string(),
            criteria: *selection.criteria(),
            rows_scanned: table.rows_seen(),
            skipped_rows: table.skipped_rows(),
            entities: table.len(),
            qualifying: selection.qualifying(),
            selected: selection.len(),
            distinct_periods: table.distinct_periods(),
            period_span: table.period_span(),
            coverage: None,
            output_rows: None,
            output_columns: None,
        }
    }

    /// Attach the coverage profile.
    pub fn with_coverage(mut self, coverage: CoverageProfile) -> Self {
        self.coverage = Some(coverage);
        self
    }

    /// Attach the extraction outcome.
    pub fn with_output(mut self, output: impl Into<String>, report: &ExtractReport) -> Self {
        self.output = Some(output.into());
        self.output_rows = Some(report.rows_written);
        self.output_columns = Some(report.columns);
        self
    }

    /// Output shape as `(rows, columns)`, if the extraction pass ran.
    pub fn output_shape(&self) -> Option<(u64, usize)> {
        self.output_rows.zip(self.output_columns)
    }

    fn metrics(&self) -> Vec<(&'static str, String)> {
        let pct = |v: Option<f64>| {
            v.map_or_else(|| "n/a".to_string(), |v| format!("{:.1}%", v * 100.0))
        };

        let mut metrics = vec![
            ("Input", self.input.clone()),
            ("Rows Scanned", self.rows_scanned.to_string()),
            ("Skipped Rows", self.skipped_rows.to_string()),
            ("Entities", self.entities.to_string()),
            (
                "Periods",
                self.period_span.map_or_else(
                    || self.distinct_periods.to_string(),
                    |span| format!("{} ({})", self.distinct_periods, span),
                ),
            ),
            ("Expected Periods", self.criteria.expected_periods.to_string()),
            (
                "Min Coverage",
                format!("{:.1}%", self.criteria.min_coverage * 100.0),
            ),
            ("Rank Estimator", self.estimator.clone()),
        ];
        if let Some(profile) = &self.coverage {
            metrics.push(("Mean Coverage", pct(profile.mean_coverage)));
            metrics.push(("Qualifying Share", pct(profile.qualifying_share)));
        }
        metrics.push(("Qualifying", self.qualifying.to_string()));
        metrics.push((
            "Selected",
            format!("{} (requested {})", self.selected, self.criteria.n_select),
        ));
        if let Some(output) = &self.output {
            metrics.push(("Output", output.clone()));
        }
        if let Some((rows, columns)) = self.output_shape() {
            metrics.push(("Output Shape", format!("({rows}, {columns})")));
        }
        metrics
    }

    /// Render as an ASCII table.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str("\nSampling Summary\n");
        output.push_str(&"=".repeat(80));
        output.push('\n');

        for (name, value) in self.metrics() {
            output.push_str(&format!("  {:<24}{}\n", format!("{name}:"), value));
        }

        output.push_str(&"=".repeat(80));
        output.push('\n');
        output
    }

    /// Render as Markdown.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str("# Sampling Summary\n\n");
        output.push_str("| Metric | Value |\n");
        output.push_str("|--------|-------|\n");
        for (name, value) in self.metrics() {
            output.push_str(&format!("| {} | {} |\n", name, value));
        }
        output
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Selected {} of {} qualifying entities ({} seen)",
            self.selected, self.qualifying, self.entities
        )?;
        if let Some((rows, columns)) = self.output_shape() {
            write!(f, ", output shape ({rows}, {columns})")?;
        }
        Ok(())
    }
}

impl Exporter for RunSummary {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => {
                let mut wtr = csv::Writer::from_writer(vec![]);
                wtr.write_record(["metric", "value"])?;
                for (name, value) in self.metrics() {
                    wtr.write_record([name, value.as_str()])?;
                }
                let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
                String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
            }
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}
