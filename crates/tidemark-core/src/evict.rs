//! Static-priority eviction.
//!
//! [`EvictionPolicy::reclaim`] frees space for a pending write by removing
//! keys from a fixed, ordered priority list until `used + required` fits
//! under the admission ceiling. Priority is configuration, not usage: there
//! is no recency tracking, so the same store contents and list always evict
//! the same keys.
//!
//! Guarantees:
//!
//! - the target key of the pending write is never evicted;
//! - keys outside the priority list are never evicted;
//! - total usage never increases.

use serde::Serialize;

use crate::keys::DEFAULT_EVICTION_PRIORITY;
use crate::quota::{QuotaBudget, SAFE_LIMIT_BYTES};
use crate::store::KeyValueStore;
use crate::usage::{size_of, total_used};

/// Result of an [`EvictionPolicy::reclaim`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReclaimOutcome {
    /// `true` iff `total_used + required <= safe_limit` after the call.
    pub satisfied: bool,
    /// Keys removed, in eviction order.
    pub evicted: Vec<String>,
    /// Bytes held by the evicted keys.
    pub freed_bytes: usize,
}

/// Ordered eviction list plus the admission ceiling it evicts towards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvictionPolicy {
    priority: Vec<String>,
    safe_limit: usize,
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_EVICTION_PRIORITY, SAFE_LIMIT_BYTES)
    }
}

impl EvictionPolicy {
    /// Create a policy evicting `priority` in order (first entry first).
    #[must_use]
    pub fn new<I, K>(priority: I, safe_limit: usize) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            priority: priority.into_iter().map(Into::into).collect(),
            safe_limit,
        }
    }

    /// Create a policy using the admission ceiling of `budget`.
    #[must_use]
    pub fn with_budget<I, K>(priority: I, budget: &QuotaBudget) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self::new(priority, budget.safe_limit)
    }

    /// The eviction order.
    #[must_use]
    pub fn priority(&self) -> &[String] {
        &self.priority
    }

    /// The admission ceiling.
    #[must_use]
    pub const fn safe_limit(&self) -> usize {
        self.safe_limit
    }

    /// Whether `required` more bytes fit given the current usage.
    #[must_use]
    pub fn fits<S: KeyValueStore + ?Sized>(&self, store: &S, required: usize) -> bool {
        total_used(store).saturating_add(required) <= self.safe_limit
    }

    /// Evict priority keys until `required` bytes fit under the ceiling.
    ///
    /// Returns immediately without evicting when the bytes already fit.
    /// Otherwise walks the priority list, removing each present key other
    /// than `target_key` and re-checking after every removal. A key whose
    /// removal fails is skipped. When the list is exhausted without making
    /// room the outcome is unsatisfied and the caller must not write.
    pub fn reclaim<S: KeyValueStore + ?Sized>(
        &self,
        store: &mut S,
        target_key: &str,
        required: usize,
    ) -> ReclaimOutcome {
        let mut outcome = ReclaimOutcome::default();

        if self.fits(&*store, required) {
            outcome.satisfied = true;
            return outcome;
        }

        for key in &self.priority {
            if key == target_key || !store.contains(key) {
                continue;
            }

            let size = size_of(&*store, key);
            if let Err(e) = store.remove(key) {
                tracing::warn!(key = %key, "eviction of key failed, skipping: {e}");
                continue;
            }

            tracing::warn!(key = %key, size, target_key, "evicted key to free storage");
            outcome.evicted.push(key.clone());
            outcome.freed_bytes += size;

            if self.fits(&*store, required) {
                outcome.satisfied = true;
                return outcome;
            }
        }

        outcome.satisfied = self.fits(&*store, required);
        if !outcome.satisfied {
            tracing::warn!(
                target_key,
                required,
                evicted = outcome.evicted.len(),
                "eviction list exhausted without freeing enough space"
            );
        }
        outcome
    }
}
