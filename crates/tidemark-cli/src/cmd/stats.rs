//! `tm stats` — storage usage dashboard.

use std::io::Write;
use std::path::Path;

use clap::Args;
use serde::Serialize;
use tidemark_core::archive::ArchiveCounts;
use tidemark_core::config::{ProjectConfig, archive_path, store_path};
use tidemark_core::usage::{StorageEntry, UsageReport};

use crate::cmd::{open_archive, open_cache, require_initialized};
use crate::output::{
    OutputMode, human_bytes, pretty_kv, pretty_rule, pretty_section, render_mode,
};

/// Arguments for `tm stats`.
#[derive(Args, Debug, Default)]
pub struct StatsArgs {
    /// Skip the per-key breakdown.
    #[arg(long)]
    pub summary: bool,
}

/// Report payload for `tm stats`.
#[derive(Debug, Serialize)]
pub struct StoreStats {
    pub usage: UsageReport,
    /// Admission ceiling writes are evicted towards.
    pub safe_limit: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<StorageEntry>,
    pub archive: ArchiveCounts,
}

/// Execute `tm stats`.
pub fn run_stats(
    args: &StatsArgs,
    output: OutputMode,
    project_root: &Path,
    config: &ProjectConfig,
) -> anyhow::Result<()> {
    require_initialized(output, &store_path(project_root))?;
    let cache = open_cache(project_root, config)?;

    let archive = if archive_path(project_root).exists() {
        open_archive(project_root)?.counts()?
    } else {
        ArchiveCounts::default()
    };

    let entries = if args.summary {
        Vec::new()
    } else {
        cache.list_entries()
    };

    let payload = StoreStats {
        usage: cache.usage_report(),
        safe_limit: cache.budget().safe_limit,
        entries,
        archive,
    };

    render_mode(
        output,
        &payload,
        |payload, w| render_stats_text(payload, w),
        |payload, w| render_stats_pretty(payload, w),
    )
}

fn render_stats_text(stats: &StoreStats, w: &mut dyn Write) -> std::io::Result<()> {
    let usage = &stats.usage;
    writeln!(
        w,
        "used {} of {} ({:.1}%){}",
        usage.total_size,
        usage.max_size,
        usage.usage_percent,
        if usage.is_near_limit { " near-limit" } else { "" }
    )?;
    writeln!(
        w,
        "archive events={} search_items={}",
        stats.archive.events, stats.archive.search_items
    )?;
    for entry in &stats.entries {
        writeln!(w, "{}\t{}", entry.size_bytes, entry.key)?;
    }
    Ok(())
}

fn render_stats_pretty(stats: &StoreStats, w: &mut dyn Write) -> std::io::Result<()> {
    let usage = &stats.usage;
    pretty_section(w, "Storage")?;
    pretty_kv(w, "Used", human_bytes(usage.total_size))?;
    pretty_kv(w, "Ceiling", human_bytes(usage.max_size))?;
    pretty_kv(w, "Usage", format!("{:.1}%", usage.usage_percent))?;
    pretty_kv(w, "Available", human_bytes(usage.available_space))?;
    pretty_kv(w, "Admission", human_bytes(stats.safe_limit))?;
    if usage.is_near_limit {
        writeln!(w, "⚠ storage nearly full")?;
    }

    writeln!(w)?;
    pretty_section(w, "Archive")?;
    pretty_kv(w, "Events", stats.archive.events.to_string())?;
    pretty_kv(w, "Search items", stats.archive.search_items.to_string())?;

    if !stats.entries.is_empty() {
        writeln!(w)?;
        pretty_section(w, "Keys")?;
        for entry in &stats.entries {
            writeln!(w, "{:>10}  {}", human_bytes(entry.size_bytes), entry.key)?;
        }
        pretty_rule(w)?;
    }
    Ok(())
}
