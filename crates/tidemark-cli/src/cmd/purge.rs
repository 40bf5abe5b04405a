//! `tm purge` — remove cached keys, optionally keeping the stored token.

use std::io::Write;
use std::path::Path;

use clap::Args;
use serde::Serialize;
use tidemark_core::config::ProjectConfig;
use tidemark_core::error::ErrorCode;
use tidemark_core::purge::PurgeReport;

use crate::cmd::{open_archive, open_cache};
use crate::output::{CliError, OutputMode, render, render_error};

/// Arguments for `tm purge`.
#[derive(Args, Debug, Default)]
pub struct PurgeArgs {
    /// Keep the token from the form-settings entry and clear the record
    /// archive as well.
    #[arg(long)]
    pub keep_secret: bool,
}

#[derive(Debug, Serialize)]
struct PurgePayload {
    #[serde(flatten)]
    report: PurgeReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    secret_preserved: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    archive_cleared: Option<bool>,
}

/// Execute `tm purge`.
pub fn run_purge(
    args: &PurgeArgs,
    output: OutputMode,
    project_root: &Path,
    config: &ProjectConfig,
) -> anyhow::Result<()> {
    let mut cache = open_cache(project_root, config)?;

    if !args.keep_secret {
        let report = cache.purge_all();
        let failed = !report.is_complete();
        let payload = PurgePayload {
            report,
            secret_preserved: None,
            archive_cleared: None,
        };
        render(output, &payload, |payload, w| render_purge_human(payload, w))?;
        if failed {
            anyhow::bail!("some keys could not be removed");
        }
        return Ok(());
    }

    let mut archive = open_archive(project_root)?;
    let outcome = cache.purge_keeping_secret(&mut archive);

    let mut reseeded = false;
    if !outcome.preserved.is_empty() {
        let plan = cache.purge_plan().clone();
        let mut settings = serde_json::Map::new();
        settings.insert(
            plan.secret_field,
            serde_json::Value::String(outcome.preserved.clone()),
        );
        reseeded = cache.write_json(&plan.secret_entry, &settings)?.is_written();
        if !reseeded {
            tracing::warn!(entry = %plan.secret_entry, "could not restore preserved token");
        }
    }

    let archive_error = outcome.archive_cleared.as_ref().err();
    let payload = PurgePayload {
        report: outcome.report,
        secret_preserved: Some(reseeded),
        archive_cleared: Some(archive_error.is_none()),
    };
    let incomplete = !payload.report.is_complete();
    render(output, &payload, |payload, w| render_purge_human(payload, w))?;

    if let Some(error) = archive_error {
        render_error(
            output,
            &CliError::from_code(ErrorCode::BulkStoreFailure, Some(&error.to_string())),
        )?;
        anyhow::bail!("record archive clear failed: {error}");
    }
    if incomplete {
        anyhow::bail!("some keys could not be removed");
    }
    Ok(())
}

fn render_purge_human(payload: &PurgePayload, w: &mut dyn Write) -> std::io::Result<()> {
    for key in &payload.report.removed {
        writeln!(w, "removed {key}")?;
    }
    for failure in &payload.report.failed {
        writeln!(w, "failed {}: {}", failure.key, failure.error)?;
    }
    if payload.secret_preserved == Some(true) {
        writeln!(w, "token preserved")?;
    }
    if payload.archive_cleared == Some(true) {
        writeln!(w, "record archive cleared")?;
    }
    writeln!(w, "✓ purged {} key(s)", payload.report.removed.len())
}
