//! Reconciliation of the event and search streams.
//!
//! # Merge Semantics
//!
//! The two streams describe overlapping sets of issues and pull requests.
//! In summary mode both are merged into one view keyed by identity:
//!
//! - search records are appended first and win identity collisions, being
//!   the more complete description of an entity;
//! - event records are appended only when their identity is unseen;
//! - the result is stable-sorted by timestamp, newest first, so search
//!   records stay ahead of event records at equal timestamps.
//!
//! The result is recomputed on every call; nothing is cached.

use std::{collections::HashSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::categorize::{categorize_search_items, process_events};
use crate::record::{RawEvent, RawSearchItem, Record};
use crate::window::DateWindow;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Which view to reconcile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApiMode {
    Events,
    Search,
    #[default]
    Summary,
}

impl ApiMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Events => "events",
            Self::Search => "search",
            Self::Summary => "summary",
        }
    }
}

impl fmt::Display for ApiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Error returned when parsing an [`ApiMode`] fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mode '{0}' (expected events, search, or summary)")]
pub struct ParseModeError(String);

impl FromStr for ApiMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "events" => Ok(Self::Events),
            "search" => Ok(Self::Search),
            "summary" => Ok(Self::Summary),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

/// Ordered records for one mode plus per-source counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reconciliation {
    pub mode: ApiMode,
    pub results: Vec<Record>,
    /// Windowed, categorized event records, whatever the mode.
    pub events_count: usize,
    /// Windowed, categorized search records, whatever the mode.
    pub search_items_count: usize,
    /// All raw events, before windowing.
    pub raw_events_count: usize,
}

impl Reconciliation {
    /// Number of records in `results`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Reconcile raw events and search items for `mode` within `window`.
#[must_use]
pub fn reconcile(
    events: &[RawEvent],
    search_items: &[RawSearchItem],
    window: &DateWindow,
    mode: ApiMode,
) -> Reconciliation {
    let event_records = process_events(events, window);
    let search_records = categorize_search_items(search_items, window);

    let events_count = event_records.len();
    let search_items_count = search_records.len();

    let results = match mode {
        ApiMode::Events => event_records,
        ApiMode::Search => search_records,
        ApiMode::Summary => merge_summary(search_records, event_records),
    };

    tracing::debug!(
        %mode,
        results = results.len(),
        events_count,
        search_items_count,
        raw_events_count = events.len(),
        "reconciled record streams"
    );

    Reconciliation {
        mode,
        results,
        events_count,
        search_items_count,
        raw_events_count: events.len(),
    }
}

/// Merge search and event records into the summary view.
///
/// Deduplicates by identity with the first occurrence winning, search
/// records first, then stable-sorts by timestamp descending.
#[must_use]
pub fn merge_summary(search: Vec<Record>, events: Vec<Record>) -> Vec<Record> {
    let mut seen: HashSet<String> = HashSet::with_capacity(search.len() + events.len());
    let mut merged: Vec<Record> = Vec::with_capacity(search.len() + events.len());

    for record in search.into_iter().chain(events) {
        if seen.insert(record.identity.clone()) {
            merged.push(record);
        }
    }

    merged.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    merged
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RecordKind, SourceKind};
    use chrono::{DateTime, Utc};

    fn record(identity: &str, at: &str, source: SourceKind) -> Record {
        Record {
            identity: identity.to_string(),
            timestamp: at.parse::<DateTime<Utc>>().expect("timestamp"),
            source,
            kind: RecordKind::Issue,
            title: String::new(),
            repo: None,
            state: None,
            actor: None,
            labels: Vec::new(),
            payload: serde_json::Value::Null,
        }
    }

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("Summary".parse::<ApiMode>(), Ok(ApiMode::Summary));
        assert_eq!("events".parse::<ApiMode>(), Ok(ApiMode::Events));
        assert!("grouped".parse::<ApiMode>().is_err());
        assert_eq!(ApiMode::Search.to_string(), "search");
    }

    #[test]
    fn search_wins_identity_collisions() {
        let search = vec![record("u1", "2024-03-05T00:00:00Z", SourceKind::Search)];
        let events = vec![record("u1", "2024-03-06T00:00:00Z", SourceKind::Event)];
        let merged = merge_summary(search, events);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source, SourceKind::Search);
    }

    #[test]
    fn ties_keep_search_before_event() {
        let search = vec![record("s", "2024-03-05T00:00:00Z", SourceKind::Search)];
        let events = vec![
            record("e", "2024-03-05T00:00:00Z", SourceKind::Event),
            record("newer", "2024-03-07T00:00:00Z", SourceKind::Event),
        ];
        let ids: Vec<String> = merge_summary(search, events)
            .into_iter()
            .map(|r| r.identity)
            .collect();
        assert_eq!(ids, vec!["newer", "s", "e"]);
    }

    #[test]
    fn duplicates_within_one_source_collapse_to_first() {
        let events = vec![
            record("u", "2024-03-01T00:00:00Z", SourceKind::Event),
            record("u", "2024-03-09T00:00:00Z", SourceKind::Event),
        ];
        let merged = merge_summary(Vec::new(), events);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].timestamp.to_rfc3339(), "2024-03-01T00:00:00+00:00");
    }

    #[test]
    fn empty_inputs_reconcile_to_nothing() {
        let window = DateWindow::parse("2024-03-01", "2024-03-31").expect("window");
        for mode in [ApiMode::Events, ApiMode::Search, ApiMode::Summary] {
            let result = reconcile(&[], &[], &window, mode);
            assert!(result.is_empty());
            assert_eq!(result.events_count, 0);
            assert_eq!(result.search_items_count, 0);
            assert_eq!(result.raw_events_count, 0);
        }
    }
}
