//! Period parsing and span tracking.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Date layouts accepted for period values, tried in order.
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Parse a period value into a calendar date.
///
/// A trailing time component (`2001-01-31 00:00:00`, `2001-01-31T00:00:00`)
/// is ignored. Returns `None` when no known layout matches.
pub fn parse_period(value: &str) -> Option<NaiveDate> {
    let date_part = value
        .trim()
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .unwrap_or_default();

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

/// Earliest and latest dates observed in a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSpan {
    /// Earliest date
    pub first: NaiveDate,
    /// Latest date
    pub last: NaiveDate,
}

impl PeriodSpan {
    /// Span covering a single date.
    pub const fn at(date: NaiveDate) -> Self {
        Self {
            first: date,
            last: date,
        }
    }

    /// Widen the span to include `date`.
    pub fn include(&mut self, date: NaiveDate) {
        if date < self.first {
            self.first = date;
        }
        if date > self.last {
            self.last = date;
        }
    }

    /// Number of calendar months touched by the span, both ends inclusive.
    pub fn months(&self) -> u32 {
        let years = self.last.year() - self.first.year();
        let months = years * 12 + self.last.month() as i32 - self.first.month() as i32 + 1;
        months.max(1) as u32
    }
}

impl fmt::Display for PeriodSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.first, self.last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[rstest]
    #[case("2001-01-31", ymd(2001, 1, 31))]
    #[case("20010131", ymd(2001, 1, 31))]
    #[case("2001/01/31", ymd(2001, 1, 31))]
    #[case("01/31/2001", ymd(2001, 1, 31))]
    #[case("2001-01-31 00:00:00", ymd(2001, 1, 31))]
    #[case("2001-01-31T00:00:00", ymd(2001, 1, 31))]
    fn test_parse_period_formats(#[case] raw: &str, #[case] expected: NaiveDate) {
        assert_eq!(parse_period(raw), Some(expected));
    }

    #[test]
    fn test_parse_period_rejects_garbage() {
        assert_eq!(parse_period("2001Q1"), None);
        assert_eq!(parse_period(""), None);
    }

    #[test]
    fn test_span_include_and_months() {
        let mut span = PeriodSpan::at(ymd(2000, 6, 30));
        span.include(ymd(2000, 1, 31));
        span.include(ymd(2019, 12, 31));
        span.include(ymd(2005, 5, 31));

        assert_eq!(span.first, ymd(2000, 1, 31));
        assert_eq!(span.last, ymd(2019, 12, 31));
        assert_eq!(span.months(), 240);
        assert_eq!(span.to_string(), "2000-01-31 .. 2019-12-31");
    }

    #[test]
    fn test_single_date_span_is_one_month() {
        assert_eq!(PeriodSpan::at(ymd(2010, 3, 1)).months(), 1);
    }
}
