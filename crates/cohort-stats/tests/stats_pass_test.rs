//! Integration tests running the statistics pass and the selection together.

use approx::assert_relative_eq;
use cohort_data::{BlockReader, ReadOptions};
use cohort_stats::{RankEstimator, SelectionCriteria, Selector, collect_stats};
use rstest::rstest;

/// A: 4 rows avg 10, B: 3 rows avg 20, C: 2 rows avg 30, interleaved by month.
const SCENARIO: &str = "date,permno,market_equity\n\
    2020-01-31,A,9\n\
    2020-01-31,B,19\n\
    2020-01-31,C,29\n\
    2020-02-29,A,11\n\
    2020-02-29,B,21\n\
    2020-02-29,C,31\n\
    2020-03-31,A,10\n\
    2020-03-31,B,20\n\
    2020-04-30,A,10\n";

fn reader(block_size: usize) -> BlockReader<&'static [u8]> {
    let options = ReadOptions {
        block_size,
        ..ReadOptions::default()
    };
    BlockReader::from_reader(SCENARIO.as_bytes(), &options).unwrap()
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(4)]
#[case(100_000)]
fn test_scenario_selection_is_block_size_independent(#[case] block_size: usize) {
    let table = collect_stats(reader(block_size), RankEstimator::GlobalMean).unwrap();

    assert_eq!(table.get("A").unwrap().observation_count, 4);
    assert_eq!(table.get("B").unwrap().observation_count, 3);
    assert_eq!(table.get("C").unwrap().observation_count, 2);
    assert_relative_eq!(table.get("A").unwrap().rank_value.unwrap(), 10.0);
    assert_relative_eq!(table.get("B").unwrap().rank_value.unwrap(), 20.0);
    assert_relative_eq!(table.get("C").unwrap().rank_value.unwrap(), 30.0);

    let selector = Selector::new(SelectionCriteria {
        n_select: 2,
        min_coverage: 0.75,
        expected_periods: 4,
    })
    .unwrap();
    let selection = selector.select(&table);
    let ids: Vec<&str> = selection.entities().iter().map(|s| s.entity.as_str()).collect();
    assert_eq!(ids, vec!["B", "A"]);
}

#[test]
fn test_observed_periods_match_months() {
    let table = collect_stats(reader(3), RankEstimator::GlobalMean).unwrap();
    assert_eq!(table.distinct_periods(), 4);
    assert_eq!(table.period_span().unwrap().months(), 4);
}

#[test]
fn test_selection_never_exceeds_n() {
    let table = collect_stats(reader(2), RankEstimator::GlobalMean).unwrap();
    for n_select in 0..5 {
        let selection = Selector::new(SelectionCriteria {
            n_select,
            min_coverage: 0.0,
            expected_periods: 4,
        })
        .unwrap()
        .select(&table);
        assert_eq!(selection.len(), n_select.min(3));
    }
}
