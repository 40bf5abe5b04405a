//! `tm put` — guarded write into the local store.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use serde::Serialize;
use tidemark_core::config::ProjectConfig;
use tidemark_core::error::ErrorCode;
use tidemark_core::writer::WriteOutcome;

use crate::cmd::open_cache;
use crate::output::{CliError, OutputMode, human_bytes, render, render_error};

/// Arguments for `tm put`.
#[derive(Args, Debug)]
#[command(group = clap::ArgGroup::new("source").required(true).args(["value", "file"]))]
pub struct PutArgs {
    /// Key to write.
    pub key: String,

    /// Value to store.
    pub value: Option<String>,

    /// Read the value from a file instead.
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

/// Report payload for `tm put`.
#[derive(Debug, Serialize)]
pub struct PutReport {
    pub key: String,
    pub status: &'static str,
    pub bytes: usize,
    pub evicted: Vec<String>,
    pub retried: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
}

impl PutReport {
    fn from_outcome(key: &str, bytes: usize, outcome: &WriteOutcome) -> Self {
        let (status, retried) = match outcome {
            WriteOutcome::Written { retried, .. } => ("written", *retried),
            WriteOutcome::Refused { .. } => ("refused", false),
            WriteOutcome::Failed { .. } => ("failed", false),
        };
        Self {
            key: key.to_string(),
            status,
            bytes,
            evicted: outcome.evicted().to_vec(),
            retried,
            error_code: outcome.code().map(ErrorCode::code),
        }
    }
}

/// Execute `tm put`.
pub fn run_put(
    args: &PutArgs,
    output: OutputMode,
    project_root: &Path,
    config: &ProjectConfig,
) -> anyhow::Result<()> {
    let value = match (&args.value, &args.file) {
        (Some(value), _) => value.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("read value from {}", path.display()))?,
        (None, None) => anyhow::bail!("a value or --file is required"),
    };

    let mut cache = open_cache(project_root, config)?;
    let outcome = cache.write(&args.key, &value);
    let report = PutReport::from_outcome(&args.key, value.len(), &outcome);

    let detail = match &outcome {
        WriteOutcome::Written { .. } => return render(output, &report, render_put_human),
        WriteOutcome::Refused { .. } => None,
        WriteOutcome::Failed { error, .. } => {
            tracing::debug!(key = %args.key, "write failed: {error}");
            Some(error.to_string())
        }
    };

    if output.is_json() {
        render(output, &report, |_, _| Ok(()))?;
    }
    // Any unsuccessful outcome leaves the value unsaved; the report keeps the real code.
    let code = ErrorCode::EvictionExhausted;
    render_error(output, &CliError::from_code(code, detail.as_deref()))?;
    anyhow::bail!("{}", code.message())
}

fn render_put_human(report: &PutReport, w: &mut dyn Write) -> std::io::Result<()> {
    write!(w, "✓ stored {} ({})", report.key, human_bytes(report.bytes))?;
    if report.retried {
        write!(w, " after retry")?;
    }
    writeln!(w)?;
    for key in &report.evicted {
        writeln!(w, "  evicted {key}")?;
    }
    Ok(())
}
