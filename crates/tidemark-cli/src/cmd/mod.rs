//! Command handlers for `tm`.

pub mod completions;
pub mod get;
pub mod ingest;
pub mod merge;
pub mod purge;
pub mod put;
pub mod reclaim;
pub mod stats;

use anyhow::{Context, Result};
use std::path::Path;
use tidemark_core::archive::SqliteArchive;
use tidemark_core::cache::LocalCache;
use tidemark_core::config::{ProjectConfig, archive_path, store_path};
use tidemark_core::error::ErrorCode;
use tidemark_core::store::FileStore;

use crate::output::{CliError, OutputMode, render_error};

/// Open the on-disk store wrapped in a [`LocalCache`] configured from
/// `config`. A missing store file opens empty.
pub fn open_cache(project_root: &Path, config: &ProjectConfig) -> Result<LocalCache<FileStore>> {
    let path = store_path(project_root);
    let store = FileStore::open(&path, config.store.hard_limit)
        .with_context(|| format!("open store {}", path.display()))?;
    Ok(LocalCache::with_settings(store, config.cache_settings()))
}

/// Open (or create) the record archive.
pub fn open_archive(project_root: &Path) -> Result<SqliteArchive> {
    SqliteArchive::open(&archive_path(project_root))
}

/// Fail with `NotInitialized` unless the state file at `path` exists.
pub fn require_initialized(output: OutputMode, path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    render_error(
        output,
        &CliError::from_code(ErrorCode::NotInitialized, Some(&path.display().to_string())),
    )?;
    anyhow::bail!("{} not found", path.display());
}
