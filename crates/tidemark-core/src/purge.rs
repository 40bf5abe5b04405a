//! Cache purge.
//!
//! A purge removes a fixed set of namespaced keys and, in the
//! secret-preserving variant, wipes the bulk record archive. Removal is
//! best-effort per key: a key that cannot be removed is recorded and the
//! purge moves on. The archive clear runs once, after every key-value
//! removal, and its failure never reverts them.

use serde::{Deserialize, Serialize};

use crate::archive::{BulkStore, BulkStoreError};
use crate::keys::{DEFAULT_PURGE_KEYS, FORM_SETTINGS, TOKEN_FIELD};
use crate::store::{KeyValueStore, StoreError};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A key whose removal failed during a purge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurgeFailure {
    pub key: String,
    pub error: String,
}

/// What a purge removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PurgeReport {
    /// Keys that were present and are now gone, in purge-list order.
    pub removed: Vec<String>,
    /// Present keys whose removal failed.
    pub failed: Vec<PurgeFailure>,
}

impl PurgeReport {
    /// Returns `true` when every present key was removed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Result of [`PurgePlan::purge_keeping_secret`].
#[derive(Debug)]
pub struct SecretPurge {
    /// The secret read before removal; empty when it could not be recovered.
    pub preserved: String,
    pub report: PurgeReport,
    /// Outcome of the bulk archive clear.
    pub archive_cleared: Result<(), BulkStoreError>,
}

/// Why the secret field could not be read from its entry.
#[derive(Debug, thiserror::Error)]
pub enum SecretReadError {
    #[error("secret entry '{entry}' could not be read: {source}")]
    Unreadable {
        entry: String,
        #[source]
        source: StoreError,
    },

    #[error("secret entry '{entry}' is not valid JSON: {source}")]
    Malformed {
        entry: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Keys to purge and where the preserved secret lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgePlan {
    #[serde(default = "default_keys")]
    pub keys: Vec<String>,
    /// Entry holding the secret, itself a JSON object.
    #[serde(default = "default_secret_entry")]
    pub secret_entry: String,
    /// Field of `secret_entry` to preserve.
    #[serde(default = "default_secret_field")]
    pub secret_field: String,
}

fn default_keys() -> Vec<String> {
    DEFAULT_PURGE_KEYS.iter().map(ToString::to_string).collect()
}

fn default_secret_entry() -> String {
    FORM_SETTINGS.to_string()
}

fn default_secret_field() -> String {
    TOKEN_FIELD.to_string()
}

impl Default for PurgePlan {
    fn default() -> Self {
        Self {
            keys: default_keys(),
            secret_entry: default_secret_entry(),
            secret_field: default_secret_field(),
        }
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

impl PurgePlan {
    /// Remove every purge key present in `store`.
    pub fn purge_all<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> PurgeReport {
        purge_all(store, &self.keys)
    }

    /// Read the secret field, purge every key, then clear `archive`.
    ///
    /// The secret is recovered as an empty string when its entry is absent,
    /// unreadable, not JSON, or lacks a string-valued field. Key removals
    /// and the secret read complete whatever the archive does.
    pub fn purge_keeping_secret<S, B>(&self, store: &mut S, archive: &mut B) -> SecretPurge
    where
        S: KeyValueStore + ?Sized,
        B: BulkStore + ?Sized,
    {
        let preserved = recover_secret(&*store, &self.secret_entry, &self.secret_field);
        let report = purge_all(store, &self.keys);

        // Bulk clear: the one blocking call, after all key-value removals.
        let archive_cleared = archive.clear();
        if let Err(e) = &archive_cleared {
            tracing::error!("failed to clear record archive: {e}");
        }

        tracing::info!(
            removed = report.removed.len(),
            failed = report.failed.len(),
            secret_preserved = !preserved.is_empty(),
            "cleared caches"
        );

        SecretPurge {
            preserved,
            report,
            archive_cleared,
        }
    }
}

/// Remove each key of `keys` that is present. Missing keys are skipped.
pub fn purge_all<S, K>(store: &mut S, keys: &[K]) -> PurgeReport
where
    S: KeyValueStore + ?Sized,
    K: AsRef<str>,
{
    let mut report = PurgeReport::default();

    for key in keys {
        let key = key.as_ref();
        if !store.contains(key) {
            continue;
        }
        match store.remove(key) {
            Ok(()) => report.removed.push(key.to_string()),
            Err(e) => {
                tracing::warn!(key, "failed to remove key during purge: {e}");
                report.failed.push(PurgeFailure {
                    key: key.to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    report
}

/// Read `field` from the JSON object stored at `entry`.
///
/// Returns `Ok(None)` when the entry is absent or the field is missing or
/// not a string.
///
/// # Errors
///
/// Returns [`SecretReadError`] when the entry cannot be read or parsed.
pub fn read_secret_field<S: KeyValueStore + ?Sized>(
    store: &S,
    entry: &str,
    field: &str,
) -> Result<Option<String>, SecretReadError> {
    let Some(raw) = store
        .get(entry)
        .map_err(|source| SecretReadError::Unreadable {
            entry: entry.to_string(),
            source,
        })?
    else {
        return Ok(None);
    };

    let value: serde_json::Value =
        serde_json::from_str(&raw).map_err(|source| SecretReadError::Malformed {
            entry: entry.to_string(),
            source,
        })?;

    Ok(value
        .get(field)
        .and_then(serde_json::Value::as_str)
        .map(str::to_string))
}

fn recover_secret<S: KeyValueStore + ?Sized>(store: &S, entry: &str, field: &str) -> String {
    match read_secret_field(store, entry, field) {
        Ok(secret) => secret.unwrap_or_default(),
        Err(e) => {
            tracing::warn!("error reading secret, continuing without it: {e}");
            String::new()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
