//! Quota-aware writes.
//!
//! [`GuardedWriter::write`] is the only path through which derived state
//! should reach the key-value store. It combines a soft pre-check against the
//! admission ceiling with a single evict-and-retry cycle for the case where
//! the store's own hard quota rejects a write the pre-check admitted.
//!
//! Running out of space is an expected outcome: it is reported as
//! [`WriteOutcome::Refused`] or [`WriteOutcome::Failed`], never as a panic or
//! an `Err`. Evictions performed along the way are kept even when the write
//! ultimately fails.

use crate::error::ErrorCode;
use crate::evict::EvictionPolicy;
use crate::store::{KeyValueStore, StoreError};
use crate::usage::{byte_len, size_of, total_used};

/// Result of a guarded write.
#[derive(Debug)]
pub enum WriteOutcome {
    /// The value is stored.
    Written {
        bytes: usize,
        evicted: Vec<String>,
        /// Whether the first attempt hit the hard quota and the retry landed.
        retried: bool,
    },
    /// Eviction could not free enough space; the store was not written.
    Refused {
        required: usize,
        evicted: Vec<String>,
    },
    /// The store rejected the write (after at most one retry).
    Failed {
        error: StoreError,
        evicted: Vec<String>,
    },
}

impl WriteOutcome {
    /// Returns `true` when the value was persisted.
    #[must_use]
    pub const fn is_written(&self) -> bool {
        matches!(self, Self::Written { .. })
    }

    /// Keys evicted while attempting the write.
    #[must_use]
    pub fn evicted(&self) -> &[String] {
        match self {
            Self::Written { evicted, .. }
            | Self::Refused { evicted, .. }
            | Self::Failed { evicted, .. } => evicted,
        }
    }

    /// Machine-readable code for unsuccessful outcomes.
    #[must_use]
    pub const fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Written { .. } => None,
            Self::Refused { .. } => Some(ErrorCode::EvictionExhausted),
            Self::Failed { error, .. } => Some(error.code()),
        }
    }
}

/// Writes values through an [`EvictionPolicy`].
#[derive(Debug, Clone, Default)]
pub struct GuardedWriter {
    policy: EvictionPolicy,
}

impl GuardedWriter {
    #[must_use]
    pub const fn new(policy: EvictionPolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub const fn policy(&self) -> &EvictionPolicy {
        &self.policy
    }

    /// Persist `value` at `key`.
    ///
    /// 1. If replacing the current value would push usage over the admission
    ///    ceiling, reclaim space first; refuse without writing if that fails.
    /// 2. Write. On a quota-exceeded rejection, reclaim once more and retry
    ///    exactly once.
    /// 3. Any other store error fails immediately.
    pub fn write<S: KeyValueStore + ?Sized>(
        &self,
        store: &mut S,
        key: &str,
        value: &str,
    ) -> WriteOutcome {
        let required = byte_len(value);
        let mut evicted = Vec::new();

        let projected = total_used(&*store)
            .saturating_sub(size_of(&*store, key))
            .saturating_add(required);

        if projected > self.policy.safe_limit() {
            tracing::debug!(key, required, projected, "write exceeds soft limit, reclaiming");
            let reclaimed = self.policy.reclaim(store, key, required);
            evicted.extend(reclaimed.evicted);
            if !reclaimed.satisfied {
                tracing::warn!(key, required, "not enough storage space, data will not be saved");
                return WriteOutcome::Refused { required, evicted };
            }
        }

        match store.set(key, value) {
            Ok(()) => WriteOutcome::Written {
                bytes: required,
                evicted,
                retried: false,
            },
            Err(error) if error.is_quota_exceeded() => {
                tracing::error!(key, "store quota exceeded, attempting cleanup: {error}");
                self.retry_after_quota(store, key, value, error, evicted)
            }
            Err(error) => {
                tracing::error!(key, "error saving key: {error}");
                WriteOutcome::Failed { error, evicted }
            }
        }
    }

    fn retry_after_quota<S: KeyValueStore + ?Sized>(
        &self,
        store: &mut S,
        key: &str,
        value: &str,
        first_error: StoreError,
        mut evicted: Vec<String>,
    ) -> WriteOutcome {
        let required = byte_len(value);
        let reclaimed = self.policy.reclaim(store, key, required);
        evicted.extend(reclaimed.evicted);

        if !reclaimed.satisfied {
            tracing::error!(key, "not enough space even after cleanup, data will not be saved");
            return WriteOutcome::Failed {
                error: first_error,
                evicted,
            };
        }

        match store.set(key, value) {
            Ok(()) => {
                tracing::info!(key, "saved data after cleanup");
                WriteOutcome::Written {
                    bytes: required,
                    evicted,
                    retried: true,
                }
            }
            Err(error) => {
                tracing::error!(key, "failed to save data even after cleanup: {error}");
                WriteOutcome::Failed { error, evicted }
            }
        }
    }
}
