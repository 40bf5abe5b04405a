//! `tm reclaim` — free space for an upcoming write without writing.

use std::io::Write;
use std::path::Path;

use clap::Args;
use serde::Serialize;
use tidemark_core::config::ProjectConfig;
use tidemark_core::error::ErrorCode;

use crate::cmd::open_cache;
use crate::output::{CliError, OutputMode, human_bytes, render, render_error};

/// Arguments for `tm reclaim`.
#[derive(Args, Debug)]
pub struct ReclaimArgs {
    /// Key the space is being made for; never evicted.
    pub target: String,

    /// Bytes the upcoming write needs.
    pub bytes: usize,
}

#[derive(Debug, Serialize)]
struct ReclaimPayload {
    target: String,
    required: usize,
    satisfied: bool,
    evicted: Vec<String>,
    freed_bytes: usize,
    total_used: usize,
}

/// Execute `tm reclaim`.
pub fn run_reclaim(
    args: &ReclaimArgs,
    output: OutputMode,
    project_root: &Path,
    config: &ProjectConfig,
) -> anyhow::Result<()> {
    let mut cache = open_cache(project_root, config)?;
    let outcome = cache.reclaim(&args.target, args.bytes);

    let payload = ReclaimPayload {
        target: args.target.clone(),
        required: args.bytes,
        satisfied: outcome.satisfied,
        evicted: outcome.evicted,
        freed_bytes: outcome.freed_bytes,
        total_used: cache.total_used(),
    };

    render(output, &payload, |payload, w| {
        for key in &payload.evicted {
            writeln!(w, "evicted {key}")?;
        }
        writeln!(
            w,
            "freed {}, now using {}",
            human_bytes(payload.freed_bytes),
            human_bytes(payload.total_used)
        )
    })?;

    if !payload.satisfied {
        render_error(
            output,
            &CliError::from_code(
                ErrorCode::EvictionExhausted,
                Some(&format!("{} bytes still do not fit", args.bytes)),
            ),
        )?;
        anyhow::bail!("not enough space for {} bytes", args.bytes);
    }
    Ok(())
}
