//! Inclusive calendar-date windows.
//!
//! Membership compares the UTC calendar date of a timestamp, not the exact
//! instant: `2024-03-31T23:59:59Z` is inside a window ending `2024-03-31`.
//! Both sources must be filtered with the same convention or per-source
//! counts and the merged view disagree.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Date format accepted by [`DateWindow::parse`].
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors from parsing a window.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WindowError {
    #[error("invalid date '{value}' (expected YYYY-MM-DD): {source}")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Inclusive `[start, end]` range of calendar dates.
///
/// An inverted window (`start > end`) contains nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    #[must_use]
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Parse `YYYY-MM-DD` bounds.
    ///
    /// # Errors
    ///
    /// Returns [`WindowError::InvalidDate`] for a malformed bound.
    pub fn parse(start: &str, end: &str) -> Result<Self, WindowError> {
        Ok(Self::new(parse_date(start)?, parse_date(end)?))
    }

    /// Whether the UTC calendar date of `timestamp` is within the window.
    #[must_use]
    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        in_window(timestamp, self.start, self.end)
    }

    /// Returns `true` when no date can satisfy the window.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

/// Inclusive date-window test on the UTC calendar date of `timestamp`.
#[must_use]
pub fn in_window(timestamp: &DateTime<Utc>, start: NaiveDate, end: NaiveDate) -> bool {
    let date = timestamp.date_naive();
    start <= date && date <= end
}

fn parse_date(value: &str) -> Result<NaiveDate, WindowError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|source| {
        WindowError::InvalidDate {
            value: value.to_string(),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().expect("valid RFC 3339 timestamp")
    }

    #[test]
    fn bounds_are_inclusive_by_calendar_date() {
        let window = DateWindow::parse("2024-03-01", "2024-03-31").expect("parse");
        assert!(window.contains(&ts("2024-03-01T00:00:00Z")));
        assert!(window.contains(&ts("2024-03-31T23:59:59Z")));
        assert!(!window.contains(&ts("2024-02-29T23:59:59Z")));
        assert!(!window.contains(&ts("2024-04-01T00:00:00Z")));
    }

    #[test]
    fn single_day_window() {
        let window = DateWindow::parse("2024-03-05", "2024-03-05").expect("parse");
        assert!(window.contains(&ts("2024-03-05T12:34:56Z")));
        assert!(!window.is_empty());
    }

    #[test]
    fn offsets_are_normalized_to_utc_dates() {
        let window = DateWindow::parse("2024-03-05", "2024-03-05").expect("parse");
        // 23:30 at -02:00 is 01:30 UTC on the 6th.
        let late = DateTime::parse_from_rfc3339("2024-03-05T23:30:00-02:00")
            .expect("parse")
            .with_timezone(&Utc);
        assert!(!window.contains(&late));
    }

    #[test]
    fn inverted_window_contains_nothing() {
        let window = DateWindow::parse("2024-03-31", "2024-03-01").expect("parse");
        assert!(window.is_empty());
        assert!(!window.contains(&ts("2024-03-15T00:00:00Z")));
    }

    #[test]
    fn malformed_dates_are_rejected() {
        let err = DateWindow::parse("03/01/2024", "2024-03-31").expect_err("bad start");
        assert!(err.to_string().contains("03/01/2024"));
    }
}
