//! Key-value store abstraction.
//!
//! Every quota component receives the store as an injected handle
//! (`&S` / `&mut S` with `S: KeyValueStore`). The store is treated as an
//! external, shared, mutable resource: nothing in this crate keeps a global
//! handle to it.
//!
//! # Module layout
//!
//! - [`memory`]: [`MemoryStore`], in-process map with an optional hard quota
//!   and injectable faults.
//! - [`file`]: [`FileStore`], a single JSON document on disk.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::ErrorCode;

/// Errors reported by a [`KeyValueStore`].
///
/// [`StoreError::QuotaExceeded`] is the only kind callers react to
/// specifically; every other variant is opaque.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The platform rejected a write because it would exceed the hard quota.
    #[error("quota exceeded writing '{key}': {attempted} bytes over a hard limit of {limit}")]
    QuotaExceeded {
        key: String,
        attempted: usize,
        limit: usize,
    },

    /// Reading or writing the backing file failed.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing document exists but cannot be decoded.
    #[error("store document is corrupt: {0}")]
    Corrupt(String),

    /// Any other backend failure.
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns `true` for the quota-exceeded failure kind.
    #[must_use]
    pub const fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }

    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::QuotaExceeded { .. } => ErrorCode::QuotaExceeded,
            Self::Io(_) | Self::Backend(_) => ErrorCode::StoreIo,
            Self::Corrupt(_) => ErrorCode::MalformedStoredEntry,
        }
    }
}

/// Synchronous string key-value store with a quota.
pub trait KeyValueStore {
    /// Read the value stored at `key`, or `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` at `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::QuotaExceeded`] when the backend's hard quota
    /// rejects the write, or another [`StoreError`] for any other failure.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be updated.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;

    /// Enumerate every stored key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be enumerated.
    fn keys(&self) -> Result<Vec<String>, StoreError>;

    /// Whether `key` may hold a value. Only a successful read returning
    /// `None` counts as absent: an unreadable key can still occupy quota.
    fn contains(&self, key: &str) -> bool {
        !matches!(self.get(key), Ok(None))
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &mut S {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        (**self).keys()
    }
}
