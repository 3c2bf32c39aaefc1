//! Sampling driver.
//!
//! [`Sampler`] runs the statistics pass, the selection and the extraction
//! pass in sequence, each pass reading the input one block at a time.
//! Progress is reported through the [`Progress`] observer and `tracing`.

use crate::config::SamplerConfig;
use crate::error::{Result, SampleError};
use cohort_data::BlockReader;
use cohort_output::{ExtractReport, Extractor, RunSummary};
use cohort_stats::{
    CoverageProfile, Selection, SelectionSet, Selector, StatsCollector, StatsTable,
};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// The two passes over the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pass {
    /// Accumulating per-entity statistics
    Statistics,
    /// Writing the rows of selected entities
    Extraction,
}

impl Pass {
    /// Human readable name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Statistics => "statistics",
            Self::Extraction => "extraction",
        }
    }
}

/// Observer notified as a run advances.
///
/// All methods default to doing nothing.
pub trait Progress {
    /// A pass is about to read its first block.
    fn pass_started(&mut self, pass: Pass) {
        let _ = pass;
    }

    /// A block was processed; `rows` is the running total for the pass.
    fn block_done(&mut self, pass: Pass, rows: u64) {
        let _ = (pass, rows);
    }

    /// A pass read its last block.
    fn pass_finished(&mut self, pass: Pass, rows: u64) {
        let _ = (pass, rows);
    }

    /// The selection was made.
    fn selected(&mut self, selection: &Selection) {
        let _ = selection;
    }
}

/// Progress observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {}

/// Statistics and selection of an input, without extraction.
#[derive(Debug, Clone)]
pub struct Ranking {
    /// Per-entity statistics
    pub stats: StatsTable,
    /// Ranked selection
    pub selection: Selection,
    /// Run summary
    pub summary: RunSummary,
}

/// Everything a complete run produced.
#[derive(Debug, Clone)]
pub struct SampleOutcome {
    /// Per-entity statistics
    pub stats: StatsTable,
    /// Ranked selection
    pub selection: Selection,
    /// Extraction counters
    pub extract: ExtractReport,
    /// Run summary
    pub summary: RunSummary,
}

/// Runs the sampling passes under one configuration.
#[derive(Debug, Clone)]
pub struct Sampler {
    config: SamplerConfig,
}

impl Sampler {
    /// Create a sampler.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: SamplerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration in use.
    pub const fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Statistics pass over `input`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be read, lacks required columns, or
    /// holds a non-numeric ranking value. No partial statistics are returned.
    pub fn collect<P: AsRef<Path>>(
        &self,
        input: P,
        progress: &mut dyn Progress,
    ) -> Result<StatsTable> {
        let input = input.as_ref();
        let mut reader = BlockReader::open(input, &self.config.read_options())?;
        if self.config.columns.period.is_some() && !reader.schema().tracks_periods() {
            warn!(
                column = ?self.config.columns.period,
                "period column not found, period tracking disabled"
            );
        }
        info!(input = %input.display(), block_size = self.config.block_size, "statistics pass");

        let mut collector = StatsCollector::new(self.config.rank_estimator);
        progress.pass_started(Pass::Statistics);
        while let Some(block) = reader.next_block()? {
            collector.observe_block(&block, reader.schema())?;
            progress.block_done(Pass::Statistics, reader.rows_read());
        }
        progress.pass_finished(Pass::Statistics, reader.rows_read());

        Ok(collector.finish())
    }

    /// Select entities from finished statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the resolved selection criteria are invalid.
    pub fn select(&self, stats: &StatsTable) -> Result<Selection> {
        let criteria = self.config.criteria(stats.distinct_periods());
        let selector = Selector::new(criteria)?;
        Ok(selector.select(stats))
    }

    /// Extraction pass: copy the rows of `selection` from `input` to `output`.
    ///
    /// The output file is created before the first block is read. On failure
    /// it is left as written so far.
    ///
    /// # Errors
    ///
    /// Returns an error if `output` names the input file, the input cannot be
    /// read, or the output cannot be created or written.
    pub fn extract<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
        selection: &SelectionSet,
        progress: &mut dyn Progress,
    ) -> Result<ExtractReport> {
        let input = input.as_ref();
        let output = output.as_ref();
        if same_file(input, output)? {
            return Err(SampleError::Config(format!(
                "output must differ from input ({})",
                output.display()
            )));
        }
        let mut reader = BlockReader::open(input, &self.config.read_options())?;
        let mut extractor = Extractor::create(
            output,
            reader.schema(),
            self.config.delimiter_byte(),
            selection,
        )?;
        info!(output = %output.display(), selected = selection.len(), "extraction pass");

        progress.pass_started(Pass::Extraction);
        while let Some(block) = reader.next_block()? {
            extractor.write_block(&block, reader.schema())?;
            progress.block_done(Pass::Extraction, reader.rows_read());
        }
        progress.pass_finished(Pass::Extraction, reader.rows_read());

        Ok(extractor.finish()?)
    }

    /// Statistics pass and selection, without writing any output.
    ///
    /// # Errors
    ///
    /// Returns an error if the statistics pass or the selection fails.
    pub fn rank<P: AsRef<Path>>(&self, input: P, progress: &mut dyn Progress) -> Result<Ranking> {
        let input = input.as_ref();
        let stats = self.collect(input, progress)?;
        let selection = self.select(&stats)?;
        progress.selected(&selection);

        let coverage = CoverageProfile::compute(&stats, selection.criteria())?;
        let summary = RunSummary::new(input.display().to_string(), &stats, &selection)
            .with_coverage(coverage);

        Ok(Ranking {
            stats,
            selection,
            summary,
        })
    }

    /// Complete run: statistics, selection and extraction.
    ///
    /// # Errors
    ///
    /// Returns the first error of any pass.
    pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input: P,
        output: Q,
        progress: &mut dyn Progress,
    ) -> Result<SampleOutcome> {
        let input = input.as_ref();
        let output = output.as_ref();

        let Ranking {
            stats,
            selection,
            summary,
        } = self.rank(input, progress)?;

        let extract = self.extract(input, output, &selection.to_set(), progress)?;
        let summary = summary.with_output(output.display().to_string(), &extract);
        info!(
            selected = selection.len(),
            rows = extract.rows_written,
            columns = extract.columns,
            "sampling complete"
        );

        Ok(SampleOutcome {
            stats,
            selection,
            extract,
            summary,
        })
    }
}

/// Whether `output` already exists and resolves to the same file as `input`.
fn same_file(input: &Path, output: &Path) -> Result<bool> {
    if !output.exists() {
        return Ok(false);
    }
    Ok(fs::canonicalize(input)? == fs::canonicalize(output)?)
}
