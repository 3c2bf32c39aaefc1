//! Bounded block reading of panel files.
//!
//! [`BlockReader`] hands out the data rows of a delimited file in blocks of at
//! most `block_size` rows. Only the current block is resident; callers drop it
//! before asking for the next one.

use crate::error::{DataError, Result};
use crate::schema::{ColumnNames, Record, Schema};
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Default number of rows per block.
pub const DEFAULT_BLOCK_SIZE: usize = 100_000;

/// Options controlling how a panel file is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadOptions {
    /// Columns to resolve against the header row
    pub columns: ColumnNames,
    /// Maximum number of rows per block
    pub block_size: usize,
    /// Field delimiter
    pub delimiter: u8,
    /// Fail when the period column is absent
    pub require_period: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            columns: ColumnNames::default(),
            block_size: DEFAULT_BLOCK_SIZE,
            delimiter: b',',
            require_period: false,
        }
    }
}

/// A contiguous run of data rows.
#[derive(Debug, Clone, Default)]
pub struct Block {
    first_row: u64,
    records: Vec<StringRecord>,
}

impl Block {
    /// 1-based data row number of the first record in the block.
    pub const fn first_row(&self) -> u64 {
        self.first_row
    }

    /// Number of rows in the block.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the block holds no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows of the block viewed through `schema`.
    pub fn rows<'a>(&'a self, schema: &'a Schema) -> impl Iterator<Item = Record<'a>> + 'a {
        self.records
            .iter()
            .zip(self.first_row..)
            .map(move |(fields, row)| schema.record(row, fields))
    }
}

/// Reads a panel file block by block.
#[derive(Debug)]
pub struct BlockReader<R> {
    reader: csv::Reader<R>,
    schema: Schema,
    block_size: usize,
    rows_read: u64,
    blocks_read: u64,
}

impl BlockReader<File> {
    /// Open the file at `path` and resolve its header.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, the header cannot be
    /// decoded, or required columns are missing.
    pub fn open<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(file, options)
    }
}

impl<R: Read> BlockReader<R> {
    /// Wrap any reader producing delimited text with a header row.
    ///
    /// # Errors
    ///
    /// Returns an error if the options are invalid, the header cannot be decoded,
    /// or required columns are missing.
    pub fn from_reader(rdr: R, options: &ReadOptions) -> Result<Self> {
        if options.block_size == 0 {
            return Err(DataError::InvalidOptions(
                "block size must be at least one row".to_string(),
            ));
        }

        // Short rows are kept; their absent fields read as missing.
        let mut reader = ReaderBuilder::new()
            .delimiter(options.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(rdr);
        let headers = reader.headers()?.clone();
        let schema = Schema::resolve(&headers, &options.columns, options.require_period)?;

        Ok(Self {
            reader,
            schema,
            block_size: options.block_size,
            rows_read: 0,
            blocks_read: 0,
        })
    }

    /// The resolved schema of the file.
    pub const fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Number of data rows read so far.
    pub const fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Number of blocks handed out so far.
    pub const fn blocks_read(&self) -> u64 {
        self.blocks_read
    }

    /// Read the next block, or `None` once the input is exhausted.
    ///
    /// # Errors
    ///
    /// Returns an error on IO failure or malformed delimited text.
    pub fn next_block(&mut self) -> Result<Option<Block>> {
        let mut records = Vec::with_capacity(self.block_size.min(8192));
        let mut record = StringRecord::new();

        while records.len() < self.block_size && self.reader.read_record(&mut record)? {
            records.push(record.clone());
        }

        if records.is_empty() {
            return Ok(None);
        }

        let block = Block {
            first_row: self.rows_read + 1,
            records,
        };
        self.rows_read += block.len() as u64;
        self.blocks_read += 1;
        debug!(
            block = self.blocks_read,
            rows = block.len(),
            total_rows = self.rows_read,
            "read block"
        );
        Ok(Some(block))
    }
}

impl<R: Read> Iterator for BlockReader<R> {
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_block().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PANEL: &str = "date,permno,market_equity\n\
        2000-01-31,1,10\n\
        2000-01-31,2,20\n\
        2000-02-29,1,11\n\
        2000-02-29,2,21\n\
        2000-03-31,1,12\n";

    fn options(block_size: usize) -> ReadOptions {
        ReadOptions {
            block_size,
            ..ReadOptions::default()
        }
    }

    #[test]
    fn test_blocks_are_bounded() {
        let reader = BlockReader::from_reader(PANEL.as_bytes(), &options(2)).unwrap();
        let sizes: Vec<usize> = reader.map(|b| b.unwrap().len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn test_row_numbers_continue_across_blocks() {
        let mut reader = BlockReader::from_reader(PANEL.as_bytes(), &options(2)).unwrap();
        let first = reader.next_block().unwrap().unwrap();
        let second = reader.next_block().unwrap().unwrap();
        assert_eq!(first.first_row(), 1);
        assert_eq!(second.first_row(), 3);

        let rows: Vec<u64> = second.rows(reader.schema()).map(|r| r.row()).collect();
        assert_eq!(rows, vec![3, 4]);
        assert_eq!(reader.rows_read(), 4);
        assert_eq!(reader.blocks_read(), 2);
    }

    #[test]
    fn test_exhausted_reader_returns_none() {
        let mut reader = BlockReader::from_reader(PANEL.as_bytes(), &options(10)).unwrap();
        assert_eq!(reader.next_block().unwrap().unwrap().len(), 5);
        assert!(reader.next_block().unwrap().is_none());
        assert!(reader.next_block().unwrap().is_none());
    }

    #[test]
    fn test_header_only_input() {
        let mut reader =
            BlockReader::from_reader("date,permno,market_equity\n".as_bytes(), &options(10))
                .unwrap();
        assert!(reader.next_block().unwrap().is_none());
        assert_eq!(reader.rows_read(), 0);
    }

    #[test]
    fn test_zero_block_size_rejected() {
        let err = BlockReader::from_reader(PANEL.as_bytes(), &options(0)).unwrap_err();
        assert!(matches!(err, DataError::InvalidOptions(_)));
    }

    #[test]
    fn test_missing_columns_detected_at_open() {
        let err = BlockReader::from_reader("date,ticker,price\n".as_bytes(), &options(10))
            .unwrap_err();
        assert!(matches!(err, DataError::MissingColumns { .. }));
    }

    #[test]
    fn test_custom_delimiter() {
        let input = "permno;market_equity\n7;1.5\n";
        let opts = ReadOptions {
            delimiter: b';',
            ..ReadOptions::default()
        };
        let mut reader = BlockReader::from_reader(input.as_bytes(), &opts).unwrap();
        let block = reader.next_block().unwrap().unwrap();
        let record = block.rows(reader.schema()).next().unwrap();
        assert_eq!(record.entity(), Some("7"));
        assert_eq!(record.rank_value().unwrap(), Some(1.5));
        assert!(!reader.schema().tracks_periods());
    }

    #[test]
    fn test_short_rows_read_as_missing() {
        let input = "date,permno,market_equity
2000-01-31,1
2000-01-31,2,20
2000-02-29
";
        let mut reader = BlockReader::from_reader(input.as_bytes(), &options(10)).unwrap();
        let block = reader.next_block().unwrap().unwrap();
        let rows: Vec<_> = block.rows(reader.schema()).collect();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].entity(), Some("1"));
        assert_eq!(rows[0].rank_value().unwrap(), None);
        assert_eq!(rows[1].rank_value().unwrap(), Some(20.0));
        assert_eq!(rows[2].entity(), None);
    }
}
