//! Bulk record archive.
//!
//! The archive holds the raw event and search-item collections between
//! runs. Cache purge only needs to wipe it, so the purge-facing seam is the
//! narrow [`BulkStore`] trait; [`SqliteArchive`] adds the load/store surface
//! used by ingestion and reconciliation.

pub mod schema;
pub mod sqlite;

pub use sqlite::{ArchiveCounts, SqliteArchive};

use std::collections::VecDeque;

use crate::error::ErrorCode;
use crate::record::{RawEvent, RawSearchItem};

/// Failure of a bulk archive operation.
#[derive(Debug, thiserror::Error)]
pub enum BulkStoreError {
    #[error("archive database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("archive record could not be encoded or decoded: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("archive backend failure: {0}")]
    Backend(String),
}

impl BulkStoreError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Codec(_) => ErrorCode::MalformedRawRecord,
            Self::Sqlite(_) | Self::Backend(_) => ErrorCode::BulkStoreFailure,
        }
    }
}

/// A store that can be wiped in one call.
pub trait BulkStore {
    /// Remove every record.
    ///
    /// # Errors
    ///
    /// Returns [`BulkStoreError`] when the backend rejects the clear.
    fn clear(&mut self) -> Result<(), BulkStoreError>;
}

impl<B: BulkStore + ?Sized> BulkStore for &mut B {
    fn clear(&mut self) -> Result<(), BulkStoreError> {
        (**self).clear()
    }
}

/// In-memory archive with injectable clear failures.
#[derive(Debug, Default)]
pub struct MemoryArchive {
    pub events: Vec<RawEvent>,
    pub search_items: Vec<RawSearchItem>,
    clear_faults: VecDeque<BulkStoreError>,
    clears: usize,
}

impl MemoryArchive {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an error to be returned by the next [`BulkStore::clear`].
    pub fn inject_clear_failure(&mut self, error: BulkStoreError) {
        self.clear_faults.push_back(error);
    }

    /// Number of successful clears.
    #[must_use]
    pub const fn clears(&self) -> usize {
        self.clears
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.search_items.is_empty()
    }
}

impl BulkStore for MemoryArchive {
    fn clear(&mut self) -> Result<(), BulkStoreError> {
        if let Some(error) = self.clear_faults.pop_front() {
            return Err(error);
        }
        self.events.clear();
        self.search_items.clear();
        self.clears += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_archive_clear_can_fail_once() {
        let mut archive = MemoryArchive::new();
        archive.inject_clear_failure(BulkStoreError::Backend("blocked".to_string()));

        let err = archive.clear().expect_err("injected failure");
        assert_eq!(err.code(), ErrorCode::BulkStoreFailure);
        assert_eq!(archive.clears(), 0);

        archive.clear().expect("second clear succeeds");
        assert_eq!(archive.clears(), 1);
        assert!(archive.is_empty());
    }

    #[test]
    fn clear_through_mutable_reference() {
        fn wipe<B: BulkStore>(mut bulk: B) -> Result<(), BulkStoreError> {
            bulk.clear()
        }
        let mut archive = MemoryArchive::new();
        wipe(&mut archive).expect("clear");
        assert_eq!(archive.clears(), 1);
    }
}
