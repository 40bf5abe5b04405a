//! `tm merge` — reconcile archived events and search items for a window.

use std::io::Write;
use std::path::Path;

use chrono::SecondsFormat;
use clap::Args;
use tidemark_core::config::archive_path;
use tidemark_core::error::ErrorCode;
use tidemark_core::reconcile::{ApiMode, Reconciliation, reconcile};
use tidemark_core::window::DateWindow;

use crate::cmd::{open_archive, require_initialized};
use crate::output::{
    CliError, OutputMode, pretty_kv, pretty_rule, pretty_section, render_error, render_mode,
};

/// Arguments for `tm merge`.
#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Which stream to return: events, search, or summary.
    #[arg(long, default_value_t = ApiMode::Summary)]
    pub mode: ApiMode,

    /// First day of the window (YYYY-MM-DD, inclusive).
    #[arg(long)]
    pub start: String,

    /// Last day of the window (YYYY-MM-DD, inclusive).
    #[arg(long)]
    pub end: String,
}

/// Execute `tm merge`.
pub fn run_merge(args: &MergeArgs, output: OutputMode, project_root: &Path) -> anyhow::Result<()> {
    let window = match DateWindow::parse(&args.start, &args.end) {
        Ok(window) => window,
        Err(e) => {
            render_error(
                output,
                &CliError::from_code(ErrorCode::InvalidDateWindow, Some(&e.to_string())),
            )?;
            return Err(e.into());
        }
    };
    if window.is_empty() {
        tracing::warn!(start = %window.start, end = %window.end, "window start is after end");
    }

    require_initialized(output, &archive_path(project_root))?;
    let archive = open_archive(project_root)?;
    let events = archive.load_events()?;
    let items = archive.load_search_items()?;

    let merged = reconcile(&events, &items, &window, args.mode);

    render_mode(
        output,
        &merged,
        |merged, w| render_merge_text(merged, w),
        |merged, w| render_merge_pretty(merged, &window, w),
    )
}

fn render_merge_text(merged: &Reconciliation, w: &mut dyn Write) -> std::io::Result<()> {
    for record in &merged.results {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}",
            record.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            record.source,
            record.kind,
            record.identity,
            record.title
        )?;
    }
    Ok(())
}

fn render_merge_pretty(
    merged: &Reconciliation,
    window: &DateWindow,
    w: &mut dyn Write,
) -> std::io::Result<()> {
    pretty_section(w, &format!("Activity {} .. {}", window.start, window.end))?;
    pretty_kv(w, "Mode", merged.mode.as_str())?;
    pretty_kv(w, "Events", merged.events_count.to_string())?;
    pretty_kv(w, "Search items", merged.search_items_count.to_string())?;
    pretty_kv(w, "Raw events", merged.raw_events_count.to_string())?;
    writeln!(w)?;

    if merged.is_empty() {
        writeln!(w, "No activity in this window.")?;
        return Ok(());
    }

    for record in &merged.results {
        let repo = record.repo.as_deref().unwrap_or("-");
        writeln!(
            w,
            "{}  {:<12} {:<24} {}",
            record.timestamp.format("%Y-%m-%d %H:%M"),
            record.kind,
            repo,
            record.title
        )?;
        writeln!(w, "  {}", record.identity)?;
    }
    pretty_rule(w)
}
