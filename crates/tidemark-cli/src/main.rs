#![forbid(unsafe_code)]

mod cmd;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode, render_error};
use std::env;
use std::path::PathBuf;
use tidemark_core::config::{EffectiveConfig, resolve_config};
use tidemark_core::error::ErrorCode;
use tidemark_core::quota::BudgetError;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "tm",
    author,
    version,
    about = "tidemark: quota-bounded activity cache",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Project directory holding `.tidemark/` (defaults to the current directory).
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Cache",
        about = "Write a value",
        long_about = "Write a value through the quota guard, evicting low-priority keys when needed.",
        after_help = "EXAMPLES:\n    # Store a value\n    tm put activity_data '{\"items\":[]}'\n\n    # Store a file's contents\n    tm put activity_data --file activity.json\n\n    # Emit machine-readable output\n    tm put activity_data '[]' --json"
    )]
    Put(cmd::put::PutArgs),

    #[command(
        next_help_heading = "Cache",
        about = "Read a value",
        long_about = "Print the value stored at a key.",
        after_help = "EXAMPLES:\n    # Print a value\n    tm get github-form-settings\n\n    # Emit machine-readable output\n    tm get github-form-settings --json"
    )]
    Get(cmd::get::GetArgs),

    #[command(
        next_help_heading = "Cache",
        about = "Show storage usage",
        long_about = "Show usage against the reporting ceiling, per-key sizes, and archive counts.",
        after_help = "EXAMPLES:\n    # Usage dashboard\n    tm stats\n\n    # Totals only\n    tm stats --summary\n\n    # Emit machine-readable output\n    tm stats --json"
    )]
    Stats(cmd::stats::StatsArgs),

    #[command(
        next_help_heading = "Cache",
        about = "Evict keys to make room",
        long_about = "Evict keys in priority order until a write of the given size would fit.",
        after_help = "EXAMPLES:\n    # Make room for 300 KiB at activity_data\n    tm reclaim activity_data 307200\n\n    # Emit machine-readable output\n    tm reclaim activity_data 307200 --json"
    )]
    Reclaim(cmd::reclaim::ReclaimArgs),

    #[command(
        next_help_heading = "Cache",
        about = "Remove cached keys",
        long_about = "Remove every purgeable key. With --keep-secret, the stored token survives and the record archive is cleared too.",
        after_help = "EXAMPLES:\n    # Drop cached data\n    tm purge\n\n    # Drop everything but keep the token\n    tm purge --keep-secret"
    )]
    Purge(cmd::purge::PurgeArgs),

    #[command(
        next_help_heading = "Activity",
        about = "Archive raw events and search items",
        long_about = "Load JSON arrays from the events feed and the issue search endpoint into the record archive.",
        after_help = "EXAMPLES:\n    # Ingest both sources\n    tm ingest --events events.json --search search.json\n\n    # Ingest events only\n    tm ingest --events events.json"
    )]
    Ingest(cmd::ingest::IngestArgs),

    #[command(
        next_help_heading = "Activity",
        about = "Reconcile archived activity",
        long_about = "Categorize, window, and merge archived records into one activity list.",
        after_help = "EXAMPLES:\n    # Merged summary for March\n    tm merge --start 2024-03-01 --end 2024-03-31\n\n    # Events only\n    tm merge --mode events --start 2024-03-01 --end 2024-03-31\n\n    # Emit machine-readable output\n    tm merge --start 2024-03-01 --end 2024-03-31 --json"
    )]
    Merge(cmd::merge::MergeArgs),

    #[command(
        next_help_heading = "Project Maintenance",
        about = "Generate shell completion scripts",
        long_about = "Generate shell completion scripts for supported shells.",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    tm completions bash\n\n    # Generate zsh completions\n    tm completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("TIDEMARK_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "tidemark_core=debug,tm=debug,info"
        } else {
            "tidemark_core=info,tm=info,warn"
        })
    });

    let format = env::var("TIDEMARK_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Map a config load failure onto its error code.
fn config_error_code(error: &anyhow::Error) -> ErrorCode {
    if error.chain().any(|cause| cause.downcast_ref::<BudgetError>().is_some()) {
        ErrorCode::InvalidQuotaBudget
    } else {
        ErrorCode::ConfigParseError
    }
}

fn load_config(cli: &Cli, project_root: &std::path::Path) -> anyhow::Result<EffectiveConfig> {
    resolve_config(project_root, cli.json).inspect_err(|e| {
        let mode = if cli.json { OutputMode::Json } else { OutputMode::Text };
        let err = CliError::from_code(config_error_code(e), Some(&format!("{e:#}")));
        if let Err(render_err) = render_error(mode, &err) {
            debug!("could not render config error: {render_err}");
        }
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::Completions(args) = &cli.command {
        let mut command = Cli::command();
        return cmd::completions::run_completions(args.shell, &mut command);
    }

    let project_root = match &cli.root {
        Some(root) => root.clone(),
        None => env::current_dir()?,
    };
    let config = load_config(&cli, &project_root)?;
    let output = OutputMode::from_resolved(&config.resolved_output);
    debug!(root = %project_root.display(), output = %config.resolved_output, "resolved config");

    let project = &config.project;
    match &cli.command {
        Commands::Put(args) => cmd::put::run_put(args, output, &project_root, project),
        Commands::Get(args) => cmd::get::run_get(args, output, &project_root, project),
        Commands::Stats(args) => cmd::stats::run_stats(args, output, &project_root, project),
        Commands::Reclaim(args) => {
            cmd::reclaim::run_reclaim(args, output, &project_root, project)
        }
        Commands::Purge(args) => cmd::purge::run_purge(args, output, &project_root, project),
        Commands::Ingest(args) => cmd::ingest::run_ingest(args, output, &project_root),
        Commands::Merge(args) => cmd::merge::run_merge(args, output, &project_root),
        Commands::Completions(_) => Ok(()),
    }
}
