//! `tm get` — read one key.

use std::io::Write;
use std::path::Path;

use clap::Args;
use serde::Serialize;
use tidemark_core::config::{ProjectConfig, store_path};
use tidemark_core::usage::byte_len;

use crate::cmd::{open_cache, require_initialized};
use crate::output::{CliError, OutputMode, render, render_error};

/// Arguments for `tm get`.
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Key to read.
    pub key: String,
}

#[derive(Debug, Serialize)]
struct GetPayload<'a> {
    key: &'a str,
    value: &'a str,
    size_bytes: usize,
}

/// Execute `tm get`.
pub fn run_get(
    args: &GetArgs,
    output: OutputMode,
    project_root: &Path,
    config: &ProjectConfig,
) -> anyhow::Result<()> {
    require_initialized(output, &store_path(project_root))?;
    let cache = open_cache(project_root, config)?;

    let value = match cache.read(&args.key) {
        Ok(Some(value)) => value,
        Ok(None) => {
            render_error(
                output,
                &CliError::new(format!("key '{}' not found", args.key)),
            )?;
            anyhow::bail!("key '{}' not found", args.key);
        }
        Err(e) => {
            render_error(output, &CliError::from_code(e.code(), Some(&e.to_string())))?;
            return Err(e.into());
        }
    };

    let payload = GetPayload {
        key: &args.key,
        value: &value,
        size_bytes: byte_len(&value),
    };
    render(output, &payload, |payload, w| writeln!(w, "{}", payload.value))
}
