//! In-process [`KeyValueStore`] with an optional hard quota.
//!
//! The hard quota models the platform-level limit that is enforced
//! independently of (and sometimes below) the soft admission ceiling, so a
//! write that passed the pre-check can still be rejected with
//! [`StoreError::QuotaExceeded`]. Faults can be queued to exercise the
//! retry and best-effort paths deterministically.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use super::{KeyValueStore, StoreError};

/// Map-backed store used for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
    hard_limit: Option<usize>,
    set_faults: VecDeque<StoreError>,
    unreadable: BTreeSet<String>,
    stuck: BTreeSet<String>,
    set_attempts: usize,
}

impl MemoryStore {
    /// Create an empty store without a hard quota.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that rejects writes pushing the total stored
    /// value bytes above `hard_limit`.
    #[must_use]
    pub fn with_hard_limit(hard_limit: usize) -> Self {
        Self {
            hard_limit: Some(hard_limit),
            ..Self::default()
        }
    }

    /// Insert a value without any quota check. Used to seed fixtures.
    pub fn insert_raw(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Queue an error returned by the next [`KeyValueStore::set`] call,
    /// before any quota check. Queued errors are consumed in FIFO order.
    pub fn inject_set_failure(&mut self, error: StoreError) {
        self.set_faults.push_back(error);
    }

    /// Make reads of `key` fail with a backend error.
    pub fn mark_unreadable(&mut self, key: impl Into<String>) {
        self.unreadable.insert(key.into());
    }

    /// Make removals of `key` fail with a backend error.
    pub fn mark_stuck(&mut self, key: impl Into<String>) {
        self.stuck.insert(key.into());
    }

    /// Number of `set` calls observed, including rejected ones.
    #[must_use]
    pub const fn set_attempts(&self) -> usize {
        self.set_attempts
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn bytes_excluding(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(_, v)| v.len())
            .sum()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        if self.unreadable.contains(key) {
            return Err(StoreError::Backend(format!("key '{key}' is unreadable")));
        }
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.set_attempts += 1;

        if let Some(fault) = self.set_faults.pop_front() {
            return Err(fault);
        }

        if let Some(limit) = self.hard_limit {
            let attempted = self.bytes_excluding(key) + value.len();
            if attempted > limit {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    attempted,
                    limit,
                });
            }
        }

        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if self.stuck.contains(key) {
            return Err(StoreError::Backend(format!("key '{key}' cannot be removed")));
        }
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.keys().cloned().collect())
    }
}
