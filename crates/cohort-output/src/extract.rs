//! Extraction pass.
//!
//! [`Extractor`] is opened on the output sink before the second pass starts.
//! It writes the input header immediately, then appends the matching rows of
//! every block as the block is read, so at most one block of rows is resident.
//! A failed run leaves whatever was written so far on disk.

use cohort_data::{Block, BlockReader, DataError, Schema};
use cohort_stats::SelectionSet;
use csv::WriterBuilder;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during extraction.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Reading the input failed
    #[error("Input error: {0}")]
    Input(#[from] DataError),

    /// Writing delimited output failed
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error, including failure to create the output file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Counters of one extraction pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractReport {
    /// Data rows read from the input
    pub rows_scanned: u64,
    /// Data rows written to the output
    pub rows_written: u64,
    /// Columns per output row
    pub columns: usize,
    /// Blocks read from the input
    pub blocks_scanned: u64,
    /// Blocks that contributed at least one row
    pub blocks_matched: u64,
}

impl ExtractReport {
    /// Output shape as `(rows, columns)`.
    pub const fn shape(&self) -> (u64, usize) {
        (self.rows_written, self.columns)
    }
}

/// Appends the rows of selected entities to a delimited sink.
#[derive(Debug)]
pub struct Extractor<'a, W: Write> {
    writer: csv::Writer<W>,
    selection: &'a SelectionSet,
    report: ExtractReport,
}

impl<'a> Extractor<'a, File> {
    /// Create (or truncate) the file at `path` and write the header.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or the header cannot be
    /// written.
    pub fn create<P: AsRef<Path>>(
        path: P,
        schema: &Schema,
        delimiter: u8,
        selection: &'a SelectionSet,
    ) -> Result<Self, ExtractError> {
        let file = File::create(path.as_ref())?;
        Self::new(file, schema, delimiter, selection)
    }
}

impl<'a, W: Write> Extractor<'a, W> {
    /// Wrap `sink` and write the header row of `schema` to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the header cannot be written.
    pub fn new(
        sink: W,
        schema: &Schema,
        delimiter: u8,
        selection: &'a SelectionSet,
    ) -> Result<Self, ExtractError> {
        let mut writer = WriterBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_writer(sink);
        writer.write_record(schema.headers())?;

        Ok(Self {
            writer,
            selection,
            report: ExtractReport {
                columns: schema.width(),
                ..ExtractReport::default()
            },
        })
    }

    /// Append the selected rows of `block`, returning how many were written.
    ///
    /// # Errors
    ///
    /// Returns an error if a row cannot be written.
    pub fn write_block(&mut self, block: &Block, schema: &Schema) -> Result<usize, ExtractError> {
        let mut written = 0;
        for record in block.rows(schema) {
            if record.entity().is_some_and(|id| self.selection.contains(id)) {
                self.writer.write_record(record.fields())?;
                written += 1;
            }
        }

        self.report.blocks_scanned += 1;
        self.report.rows_scanned += block.len() as u64;
        if written > 0 {
            self.report.blocks_matched += 1;
            self.report.rows_written += written as u64;
        }
        debug!(
            block = self.report.blocks_scanned,
            rows = block.len(),
            written,
            "extracted block"
        );
        Ok(written)
    }

    /// Counters so far.
    pub const fn report(&self) -> &ExtractReport {
        &self.report
    }

    /// Flush the sink and hand it back together with the final counters.
    ///
    /// # Errors
    ///
    /// Returns an error if buffered output cannot be flushed.
    pub fn into_inner(self) -> Result<(ExtractReport, W), ExtractError> {
        let report = self.report;
        let sink = self
            .writer
            .into_inner()
            .map_err(|e| ExtractError::Io(e.into_error()))?;
        info!(
            rows = report.rows_written,
            columns = report.columns,
            "extraction pass complete"
        );
        Ok((report, sink))
    }

    /// Flush the sink and return the final counters.
    ///
    /// # Errors
    ///
    /// Returns an error if buffered output cannot be flushed.
    pub fn finish(self) -> Result<ExtractReport, ExtractError> {
        let (report, mut sink) = self.into_inner()?;
        sink.flush()?;
        Ok(report)
    }
}

/// Run a complete extraction pass from `reader` into `sink`.
///
/// # Errors
///
/// Returns the first read or write error.
pub fn extract<R: Read, W: Write>(
    mut reader: BlockReader<R>,
    sink: W,
    delimiter: u8,
    selection: &SelectionSet,
) -> Result<(ExtractReport, W), ExtractError> {
    let mut extractor = Extractor::new(sink, reader.schema(), delimiter, selection)?;
    while let Some(block) = reader.next_block()? {
        extractor.write_block(&block, reader.schema())?;
    }
    extractor.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cohort_data::ReadOptions;
    use cohort_stats::EntityId;

    const PANEL: &str = "date,permno,market_equity,ret\n\
        2020-01-31,1,10,0.01\n\
        2020-01-31,2,20,0.02\n\
        2020-01-31,3,30,0.03\n\
        2020-02-29,1,11,-0.01\n\
        2020-02-29,,99,0.00\n\
        2020-02-29,3,31,\n";

    fn run(selected: &[&str], block_size: usize) -> (ExtractReport, String) {
        let options = ReadOptions {
            block_size,
            ..ReadOptions::default()
        };
        let reader = BlockReader::from_reader(PANEL.as_bytes(), &options).unwrap();
        let selection: SelectionSet = selected.iter().map(|id| EntityId::from(*id)).collect();
        let (report, sink) = extract(reader, Vec::new(), b',', &selection).unwrap();
        (report, String::from_utf8(sink).unwrap())
    }

    #[test]
    fn test_only_selected_rows_in_original_order() {
        let (report, output) = run(&["3", "1"], 2);
        assert_eq!(
            output,
            "date,permno,market_equity,ret\n\
             2020-01-31,1,10,0.01\n\
             2020-01-31,3,30,0.03\n\
             2020-02-29,1,11,-0.01\n\
             2020-02-29,3,31,\n"
        );
        assert_eq!(report.shape(), (4, 4));
        assert_eq!(report.rows_scanned, 6);
        assert_eq!(report.blocks_scanned, 3);
        assert_eq!(report.blocks_matched, 3);
    }

    #[test]
    fn test_blocks_without_matches_write_nothing() {
        let (report, output) = run(&["2"], 2);
        assert_eq!(output, "date,permno,market_equity,ret\n2020-01-31,2,20,0.02\n");
        assert_eq!(report.blocks_matched, 1);
    }

    #[test]
    fn test_empty_selection_writes_header_only() {
        let (report, output) = run(&[], 4);
        assert_eq!(output, "date,permno,market_equity,ret\n");
        assert_eq!(report.shape(), (0, 4));
    }

    #[test]
    fn test_output_independent_of_block_size() {
        let (_, reference) = run(&["1", "2"], 1);
        for block_size in [2, 3, 5, 100] {
            assert_eq!(run(&["1", "2"], block_size).1, reference);
        }
    }
}
