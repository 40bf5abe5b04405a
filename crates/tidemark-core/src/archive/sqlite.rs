//! SQLite-backed record archive.
//!
//! Runtime defaults match the rest of the workspace:
//! - `journal_mode = WAL` so readers do not block the ingest writer
//! - `busy_timeout = 5s` to ride out transient lock contention

use anyhow::{Context, Result};
use chrono::SecondsFormat;
use rusqlite::{Connection, params};
use serde::Serialize;
use std::{path::Path, time::Duration};

use super::{BulkStore, BulkStoreError, schema};
use crate::record::{RawEvent, RawSearchItem};

/// Busy timeout used for archive connections.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Number of stored records per stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ArchiveCounts {
    pub events: usize,
    pub search_items: usize,
}

/// Raw events and search items persisted in SQLite.
///
/// Records are upserted by their source id; an upsert keeps the record's
/// original position in load order.
#[derive(Debug)]
pub struct SqliteArchive {
    conn: Connection,
}

impl SqliteArchive {
    /// Open (or create) the archive at `path` and migrate its schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory, connection, pragmas, or migration
    /// fail.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create archive directory {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("open archive database {}", path.display()))?;
        Self::from_connection(conn)
    }

    /// Open a private in-memory archive.
    ///
    /// # Errors
    ///
    /// Returns an error if configuring or migrating the connection fails.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory archive")?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        configure_connection(&conn).context("configure sqlite pragmas")?;
        schema::migrate(&mut conn).context("apply archive migrations")?;
        Ok(Self { conn })
    }

    /// Upsert events by id. Returns the number written.
    ///
    /// # Errors
    ///
    /// Returns [`BulkStoreError`] if encoding or the transaction fails.
    pub fn put_events(&mut self, events: &[RawEvent]) -> Result<usize, BulkStoreError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO raw_events (event_id, event_type, created_at, body)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(event_id) DO UPDATE SET
                     event_type = excluded.event_type,
                     created_at = excluded.created_at,
                     body = excluded.body",
            )?;
            for event in events {
                let body = serde_json::to_string(event)?;
                stmt.execute(params![
                    event.id,
                    event.event_type,
                    event.created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
                    body,
                ])?;
            }
        }
        tx.commit()?;
        tracing::debug!(count = events.len(), "archived raw events");
        Ok(events.len())
    }

    /// Upsert search items by id. Returns the number written.
    ///
    /// # Errors
    ///
    /// Returns [`BulkStoreError`] if encoding or the transaction fails.
    pub fn put_search_items(&mut self, items: &[RawSearchItem]) -> Result<usize, BulkStoreError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO raw_search_items (item_id, html_url, updated_at, body)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(item_id) DO UPDATE SET
                     html_url = excluded.html_url,
                     updated_at = excluded.updated_at,
                     body = excluded.body",
            )?;
            for item in items {
                let body = serde_json::to_string(item)?;
                let id = i64::try_from(item.id).map_err(|_| {
                    BulkStoreError::Backend(format!("search item id {} out of range", item.id))
                })?;
                stmt.execute(params![
                    id,
                    item.html_url,
                    item.updated_at.to_rfc3339_opts(SecondsFormat::Micros, true),
                    body,
                ])?;
            }
        }
        tx.commit()?;
        tracing::debug!(count = items.len(), "archived raw search items");
        Ok(items.len())
    }

    /// All events in first-insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`BulkStoreError`] if the query fails or a stored body is
    /// malformed.
    pub fn load_events(&self) -> Result<Vec<RawEvent>, BulkStoreError> {
        self.load_bodies("SELECT body FROM raw_events ORDER BY seq")
    }

    /// All search items in first-insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`BulkStoreError`] if the query fails or a stored body is
    /// malformed.
    pub fn load_search_items(&self) -> Result<Vec<RawSearchItem>, BulkStoreError> {
        self.load_bodies("SELECT body FROM raw_search_items ORDER BY seq")
    }

    /// Stored record counts.
    ///
    /// # Errors
    ///
    /// Returns [`BulkStoreError`] if a count query fails.
    pub fn counts(&self) -> Result<ArchiveCounts, BulkStoreError> {
        let count = |table: &str| -> Result<usize, BulkStoreError> {
            let n: i64 = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
            Ok(usize::try_from(n).unwrap_or_default())
        };
        Ok(ArchiveCounts {
            events: count("raw_events")?,
            search_items: count("raw_search_items")?,
        })
    }

    fn load_bodies<T: serde::de::DeserializeOwned>(
        &self,
        sql: &str,
    ) -> Result<Vec<T>, BulkStoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let bodies = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        bodies
            .iter()
            .map(|body| serde_json::from_str(body).map_err(BulkStoreError::from))
            .collect()
    }
}

impl BulkStore for SqliteArchive {
    fn clear(&mut self) -> Result<(), BulkStoreError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM raw_events", [])?;
        tx.execute("DELETE FROM raw_search_items", [])?;
        tx.commit()?;
        tracing::info!("cleared record archive");
        Ok(())
    }
}

fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
    Ok(())
}
