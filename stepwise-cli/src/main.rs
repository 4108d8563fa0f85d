//! Stepwise CLI - ordered SQL migrations with batch rollback

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{create, init, migrate, rollback, status};

/// Stepwise - apply and revert SQL migrations in steps
#[derive(Parser)]
#[command(name = "stepwise", version, about, long_about = None)]
struct Cli {
    /// Project directory containing stepwise.json
    #[arg(long, global = true, env = "STEPWISE_DIR", default_value = ".")]
    project_dir: PathBuf,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default stepwise.json and create the migration store
    Init,

    /// Create new migration script(s)
    Create {
        /// Migration name (sanitized into the file name)
        name: String,
        /// Create an _up/_down pair instead of a single script
        #[arg(long)]
        pair: bool,
    },

    /// Apply all pending migrations as one step
    Migrate {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Revert the most recent step
    Rollback {
        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show applied and pending migrations
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&e);
            ExitCode::FAILURE
        }
    }
}

/// Send tracing output to stderr, filtered by RUST_LOG or the -v count
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> Result<()> {
    let project_dir = cli.project_dir;
    tracing::debug!(project_dir = %project_dir.display(), "Resolved project directory");

    match cli.command {
        Commands::Init => init::run(&project_dir),
        Commands::Create { name, pair } => create::run(&project_dir, &name, pair),
        Commands::Migrate { json } => migrate::run(&project_dir, json),
        Commands::Rollback { force, json } => rollback::run(&project_dir, force, json),
        Commands::Status { json } => status::run(&project_dir, json),
    }
}
