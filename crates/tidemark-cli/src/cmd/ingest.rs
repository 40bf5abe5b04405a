//! `tm ingest` — load raw GitHub events and search items into the archive.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tidemark_core::archive::ArchiveCounts;
use tidemark_core::error::ErrorCode;
use tidemark_core::record::{RawEvent, RawSearchItem};

use crate::cmd::open_archive;
use crate::output::{CliError, OutputMode, pretty_kv, render, render_error};

/// Arguments for `tm ingest`.
#[derive(Args, Debug, Default)]
#[command(group = clap::ArgGroup::new("input").required(true).multiple(true).args(["events", "search"]))]
pub struct IngestArgs {
    /// JSON array of events from the user events feed.
    #[arg(long, value_name = "PATH")]
    pub events: Option<PathBuf>,

    /// JSON array of items from the issue search endpoint.
    #[arg(long, value_name = "PATH")]
    pub search: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct IngestReport {
    events_written: usize,
    search_items_written: usize,
    totals: ArchiveCounts,
}

/// Execute `tm ingest`.
pub fn run_ingest(args: &IngestArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    // Parse everything before touching the archive so a bad file ingests nothing.
    let events: Vec<RawEvent> = match &args.events {
        Some(path) => read_records(output, path)?,
        None => Vec::new(),
    };
    let items: Vec<RawSearchItem> = match &args.search {
        Some(path) => read_records(output, path)?,
        None => Vec::new(),
    };

    let mut archive = open_archive(project_root)?;
    let events_written = archive.put_events(&events)?;
    let search_items_written = archive.put_search_items(&items)?;
    tracing::info!(events_written, search_items_written, "ingested raw records");

    let report = IngestReport {
        events_written,
        search_items_written,
        totals: archive.counts()?,
    };

    render(output, &report, |report, w| {
        pretty_kv(w, "Events", report.events_written.to_string())?;
        pretty_kv(w, "Search items", report.search_items_written.to_string())?;
        writeln!(
            w,
            "archive now holds {} event(s), {} search item(s)",
            report.totals.events, report.totals.search_items
        )
    })
}

fn read_records<T: DeserializeOwned>(output: OutputMode, path: &Path) -> anyhow::Result<Vec<T>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    match serde_json::from_str(&content) {
        Ok(records) => Ok(records),
        Err(e) => {
            let detail = format!("{}: {e}", path.display());
            render_error(
                output,
                &CliError::from_code(ErrorCode::MalformedRawRecord, Some(&detail)),
            )?;
            Err(e).with_context(|| format!("parse {}", path.display()))
        }
    }
}
