//! Integration tests for reading panel files from disk.

use cohort_data::{BlockReader, ColumnNames, DataError, ReadOptions};
use std::fs;
use std::path::PathBuf;

fn write_fixture(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "cohort_data_{}_{}.csv",
        name,
        std::process::id()
    ));
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_read_file_in_blocks() {
    let mut content = String::from("date,permno,market_equity\n");
    for month in 1..=12 {
        for permno in [10001, 10002, 10003] {
            content.push_str(&format!("2020-{month:02}-28,{permno},{}\n", permno as f64 / 10.0));
        }
    }
    let path = write_fixture("blocks", &content);

    let options = ReadOptions {
        block_size: 5,
        ..ReadOptions::default()
    };
    let mut reader = BlockReader::open(&path, &options).unwrap();

    let mut total = 0;
    let mut blocks = 0;
    while let Some(block) = reader.next_block().unwrap() {
        assert!(block.len() <= 5);
        for row in block.rows(reader.schema()) {
            assert!(row.entity().is_some());
            assert!(row.rank_value().unwrap().is_some());
        }
        total += block.len();
        blocks += 1;
    }

    assert_eq!(total, 36);
    assert_eq!(blocks, 8);
    assert_eq!(reader.rows_read(), 36);

    fs::remove_file(path).ok();
}

#[test]
fn test_quoted_fields_are_preserved() {
    let path = write_fixture(
        "quoted",
        "permno,market_equity,name\n1,5.0,\"Acme, Inc.\"\n2,,\"Widgets \"\"R\"\" Us\"\n",
    );

    let mut reader = BlockReader::open(&path, &ReadOptions::default()).unwrap();
    let block = reader.next_block().unwrap().unwrap();
    let rows: Vec<_> = block.rows(reader.schema()).collect();

    assert_eq!(rows[0].fields().get(2), Some("Acme, Inc."));
    assert_eq!(rows[1].fields().get(2), Some("Widgets \"R\" Us"));
    assert_eq!(rows[1].rank_value().unwrap(), None);

    fs::remove_file(path).ok();
}

#[test]
fn test_required_period_column() {
    let path = write_fixture("no_period", "permno,market_equity\n1,5.0\n");

    let options = ReadOptions {
        require_period: true,
        ..ReadOptions::default()
    };
    let err = BlockReader::open(&path, &options).unwrap_err();
    match err {
        DataError::MissingColumns { missing, .. } => assert_eq!(missing, vec!["date"]),
        other => panic!("unexpected error: {other}"),
    }

    fs::remove_file(path).ok();
}

#[test]
fn test_custom_column_names() {
    let path = write_fixture("custom", "month,gvkey,mktcap\n200101,A,3\n200102,A,4\n");

    let options = ReadOptions {
        columns: ColumnNames {
            entity: "gvkey".to_string(),
            rank: "mktcap".to_string(),
            period: Some("month".to_string()),
        },
        ..ReadOptions::default()
    };
    let mut reader = BlockReader::open(&path, &options).unwrap();
    let block = reader.next_block().unwrap().unwrap();
    let periods: Vec<_> = block.rows(reader.schema()).filter_map(|r| r.period()).collect();
    assert_eq!(periods, vec!["200101", "200102"]);

    fs::remove_file(path).ok();
}

#[test]
fn test_missing_file_is_io_error() {
    let path = std::env::temp_dir().join("cohort_data_does_not_exist.csv");
    let err = BlockReader::open(&path, &ReadOptions::default()).unwrap_err();
    assert!(matches!(err, DataError::Io(_)));
}
