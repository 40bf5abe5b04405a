//! Byte accounting over a [`KeyValueStore`].
//!
//! Sizes are UTF-8 byte lengths of stored values. Every function here is
//! best-effort: a key that cannot be read counts as 0 bytes and a store that
//! cannot be enumerated counts as empty. The underlying failures are logged,
//! never propagated, because a usage estimate is only ever an input to an
//! admission decision.

use serde::Serialize;

use crate::quota::QuotaBudget;
use crate::store::{KeyValueStore, StoreError};

/// Per-key usage, derived on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageEntry {
    pub key: String,
    pub size_bytes: usize,
}

/// Usage summary measured against the reporting ceiling.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageReport {
    /// Bytes currently stored.
    pub total_size: usize,
    /// The reporting ceiling (`report_limit`), not the admission ceiling.
    pub max_size: usize,
    /// `total_size / max_size * 100`.
    pub usage_percent: f64,
    /// `max_size - total_size`, saturating at 0.
    pub available_space: usize,
    /// Whether `usage_percent` exceeds the near-limit threshold.
    pub is_near_limit: bool,
}

/// UTF-8 byte length of a value.
#[must_use]
pub const fn byte_len(value: &str) -> usize {
    value.len()
}

/// Size of the value at `key`, or an error if the key cannot be read.
///
/// Absent keys have size 0.
///
/// # Errors
///
/// Propagates the store's read error.
pub fn try_size_of<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> Result<usize, StoreError> {
    Ok(store.get(key)?.as_deref().map_or(0, byte_len))
}

/// Size of the value at `key`; 0 when absent or unreadable.
#[must_use]
pub fn size_of<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> usize {
    try_size_of(store, key).unwrap_or_else(|e| {
        tracing::warn!(key, "could not read key for sizing, counting 0 bytes: {e}");
        0
    })
}

/// Sum of [`size_of`] over every stored key.
#[must_use]
pub fn total_used<S: KeyValueStore + ?Sized>(store: &S) -> usize {
    match store.keys() {
        Ok(keys) => keys.iter().map(|key| size_of(store, key)).sum(),
        Err(e) => {
            tracing::warn!("could not enumerate store keys, counting 0 bytes: {e}");
            0
        }
    }
}

/// Every stored key with its size, largest first, ties by key ascending.
///
/// Used for diagnostics only.
#[must_use]
pub fn list_entries<S: KeyValueStore + ?Sized>(store: &S) -> Vec<StorageEntry> {
    let keys = match store.keys() {
        Ok(keys) => keys,
        Err(e) => {
            tracing::warn!("could not enumerate store keys: {e}");
            return Vec::new();
        }
    };

    let mut entries: Vec<StorageEntry> = keys
        .into_iter()
        .map(|key| StorageEntry {
            size_bytes: size_of(store, &key),
            key,
        })
        .collect();

    entries.sort_by(|a, b| {
        b.size_bytes
            .cmp(&a.size_bytes)
            .then_with(|| a.key.cmp(&b.key))
    });
    entries
}

/// Whether `required` more bytes fit under the admission ceiling.
#[must_use]
pub fn has_enough_space<S: KeyValueStore + ?Sized>(
    store: &S,
    budget: &QuotaBudget,
    required: usize,
) -> bool {
    budget.admits(total_used(store), required)
}

/// Usage statistics relative to `budget.report_limit`.
#[must_use]
pub fn usage_report<S: KeyValueStore + ?Sized>(store: &S, budget: &QuotaBudget) -> UsageReport {
    let total_size = total_used(store);
    let max_size = budget.report_limit;

    #[allow(clippy::cast_precision_loss)]
    let usage_percent = if max_size == 0 {
        100.0
    } else {
        total_size as f64 / max_size as f64 * 100.0
    };

    UsageReport {
        total_size,
        max_size,
        usage_percent,
        available_space: max_size.saturating_sub(total_size),
        is_near_limit: usage_percent > budget.near_limit_percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quota::REPORT_LIMIT_BYTES;
    use crate::store::MemoryStore;

    #[test]
    fn byte_len_counts_utf8_bytes_not_chars() {
        assert_eq!(byte_len(""), 0);
        assert_eq!(byte_len("abc"), 3);
        assert_eq!(byte_len("é"), 2);
        assert_eq!(byte_len("日本"), 6);
        assert_eq!(byte_len("🦀"), 4);
    }

    #[test]
    fn absent_key_has_zero_size() {
        let store = MemoryStore::new();
        assert_eq!(size_of(&store, "missing"), 0);
    }

    #[test]
    fn unreadable_key_counts_as_zero() {
        let mut store = MemoryStore::new();
        store.insert_raw("good", "12345");
        store.insert_raw("bad", "1234567890");
        store.mark_unreadable("bad");
        assert_eq!(size_of(&store, "bad"), 0);
        assert!(try_size_of(&store, "bad").is_err());
        assert_eq!(total_used(&store), 5);
    }

    #[test]
    fn list_entries_sorts_by_size_then_key() {
        let mut store = MemoryStore::new();
        store.insert_raw("b", "xx");
        store.insert_raw("a", "xx");
        store.insert_raw("c", "xxxxx");
        store.insert_raw("d", "");

        let keys: Vec<(String, usize)> = list_entries(&store)
            .into_iter()
            .map(|e| (e.key, e.size_bytes))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("c".to_string(), 5),
                ("a".to_string(), 2),
                ("b".to_string(), 2),
                ("d".to_string(), 0),
            ]
        );
    }

    #[test]
    fn has_enough_space_uses_safe_limit() {
        let budget = QuotaBudget {
            safe_limit: 10,
            report_limit: 20,
            near_limit_percent: 80.0,
        };
        let mut store = MemoryStore::new();
        store.insert_raw("a", "123456");
        assert!(has_enough_space(&store, &budget, 4));
        assert!(!has_enough_space(&store, &budget, 5));
    }

    #[test]
    fn usage_report_measures_against_report_limit() {
        let mut store = MemoryStore::new();
        store.insert_raw("big", "x".repeat(REPORT_LIMIT_BYTES / 2));
        let report = usage_report(&store, &QuotaBudget::default());
        assert_eq!(report.max_size, REPORT_LIMIT_BYTES);
        assert!((report.usage_percent - 50.0).abs() < f64::EPSILON);
        assert_eq!(report.available_space, REPORT_LIMIT_BYTES / 2);
        assert!(!report.is_near_limit);
    }

    #[test]
    fn near_limit_fires_above_eighty_percent_of_report_limit() {
        let mut store = MemoryStore::new();
        // 4.3 MiB: below the 4.5 MiB admission ceiling, above 80% of 5 MiB.
        store.insert_raw("big", "x".repeat(4_508_877));
        let report = usage_report(&store, &QuotaBudget::default());
        assert!(report.is_near_limit);
        assert!(has_enough_space(&store, &QuotaBudget::default(), 1));
    }
}
