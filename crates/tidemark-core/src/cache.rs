//! Quota-bounded local cache.
//!
//! [`LocalCache`] bundles an injected [`KeyValueStore`] with the budget,
//! eviction order, and purge plan that govern it. It owns no state beyond
//! that configuration: every figure it reports is recomputed from the store
//! on each call.
//!
//! # Usage
//!
//! ```rust
//! use tidemark_core::cache::LocalCache;
//! use tidemark_core::store::MemoryStore;
//!
//! let mut cache = LocalCache::new(MemoryStore::new());
//! assert!(cache.write("github-ui-settings", "{}").is_written());
//! assert_eq!(cache.total_used(), 2);
//! ```

use serde::{Deserialize, Serialize};

use crate::archive::BulkStore;
use crate::evict::{EvictionPolicy, ReclaimOutcome};
use crate::keys::DEFAULT_EVICTION_PRIORITY;
use crate::purge::{PurgePlan, PurgeReport, SecretPurge};
use crate::quota::QuotaBudget;
use crate::store::{KeyValueStore, StoreError};
use crate::usage::{self, StorageEntry, UsageReport};
use crate::writer::{GuardedWriter, WriteOutcome};

// ---------------------------------------------------------------------------
// CacheSettings
// ---------------------------------------------------------------------------

/// Everything that shapes cache behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSettings {
    pub budget: QuotaBudget,
    /// Eviction order, first entry evicted first.
    pub eviction_priority: Vec<String>,
    pub purge: PurgePlan,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            budget: QuotaBudget::default(),
            eviction_priority: DEFAULT_EVICTION_PRIORITY
                .iter()
                .map(ToString::to_string)
                .collect(),
            purge: PurgePlan::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// LocalCache
// ---------------------------------------------------------------------------

/// A key-value store plus the rules bounding it.
#[derive(Debug)]
pub struct LocalCache<S> {
    store: S,
    budget: QuotaBudget,
    writer: GuardedWriter,
    purge: PurgePlan,
}

impl<S: KeyValueStore> LocalCache<S> {
    /// Wrap `store` with the default budget, eviction order, and purge plan.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self::with_settings(store, CacheSettings::default())
    }

    /// Wrap `store` with explicit settings.
    #[must_use]
    pub fn with_settings(store: S, settings: CacheSettings) -> Self {
        let policy = EvictionPolicy::with_budget(settings.eviction_priority, &settings.budget);
        Self {
            store,
            budget: settings.budget,
            writer: GuardedWriter::new(policy),
            purge: settings.purge,
        }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    #[must_use]
    pub fn into_inner(self) -> S {
        self.store
    }

    #[must_use]
    pub const fn budget(&self) -> &QuotaBudget {
        &self.budget
    }

    #[must_use]
    pub const fn policy(&self) -> &EvictionPolicy {
        self.writer.policy()
    }

    #[must_use]
    pub const fn purge_plan(&self) -> &PurgePlan {
        &self.purge
    }

    // -----------------------------------------------------------------------
    // Usage
    // -----------------------------------------------------------------------

    /// Byte size of the value at `key`; 0 when absent or unreadable.
    #[must_use]
    pub fn size_of(&self, key: &str) -> usize {
        usage::size_of(&self.store, key)
    }

    /// Total bytes stored.
    #[must_use]
    pub fn total_used(&self) -> usize {
        usage::total_used(&self.store)
    }

    /// Every entry, largest first.
    #[must_use]
    pub fn list_entries(&self) -> Vec<StorageEntry> {
        usage::list_entries(&self.store)
    }

    /// Usage relative to the reporting ceiling.
    #[must_use]
    pub fn usage_report(&self) -> UsageReport {
        usage::usage_report(&self.store, &self.budget)
    }

    /// Whether `required` more bytes fit under the admission ceiling.
    #[must_use]
    pub fn has_enough_space(&self, required: usize) -> bool {
        usage::has_enough_space(&self.store, &self.budget, required)
    }

    // -----------------------------------------------------------------------
    // Reads and writes
    // -----------------------------------------------------------------------

    /// Read the value at `key`.
    ///
    /// # Errors
    ///
    /// Propagates the store's read error.
    pub fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.store.get(key)
    }

    /// Evict priority keys until `required` bytes fit.
    pub fn reclaim(&mut self, target_key: &str, required: usize) -> ReclaimOutcome {
        self.writer.policy().reclaim(&mut self.store, target_key, required)
    }

    /// Guarded write of `value` at `key`.
    pub fn write(&mut self, key: &str, value: &str) -> WriteOutcome {
        self.writer.write(&mut self.store, key, value)
    }

    /// Serialize `value` to JSON and write it.
    ///
    /// # Errors
    ///
    /// Returns the serialization error; nothing is written in that case.
    pub fn write_json<T: Serialize + ?Sized>(
        &mut self,
        key: &str,
        value: &T,
    ) -> Result<WriteOutcome, serde_json::Error> {
        let encoded = serde_json::to_string(value)?;
        Ok(self.write(key, &encoded))
    }

    // -----------------------------------------------------------------------
    // Purge
    // -----------------------------------------------------------------------

    /// Remove every purge key.
    pub fn purge_all(&mut self) -> PurgeReport {
        self.purge.purge_all(&mut self.store)
    }

    /// Preserve the secret field, remove every purge key, clear `archive`.
    pub fn purge_keeping_secret<B: BulkStore + ?Sized>(&mut self, archive: &mut B) -> SecretPurge {
        self.purge.purge_keeping_secret(&mut self.store, archive)
    }
}
