use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use media_indexer::error::lock_holder;

mod commands;

/// Exit status when another instance holds the run lock.
const EXIT_LOCKED: i32 = 2;

#[derive(Parser)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about = "Incremental media metadata indexer", long_about = None)]
struct Cli {
    /// Settings file (TOML)
    config: PathBuf,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync changed records, then hide staged documents whose source is gone (default)
    Run,

    /// Stage documents for records changed since the last run
    Sync {
        /// Ignore the checkpoint and index every record
        #[arg(long)]
        full: bool,

        /// Also submit each document to the index and commit at the end
        #[arg(long)]
        publish: bool,
    },

    /// Hide staged documents whose source record no longer exists
    Shadow,

    /// Rebuild, publish and commit a single record
    Reindex {
        /// Current or legacy identifier
        id: String,
    },

    /// Submit staged documents to the index and commit
    Publish {
        /// Publish every staged document
        #[arg(long, conflicts_with = "files")]
        all: bool,

        /// Staged files to publish
        files: Vec<PathBuf>,
    },

    /// Commit pending index changes
    Commit,

    /// Optimize the index
    Optimize,

    /// Report public titles, media files and bytes
    Stats,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn dispatch(cli: Cli) -> Result<i32> {
    let config = cli.config.as_path();
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => commands::run::execute(config),
        Commands::Sync { full, publish } => commands::sync::execute(config, full, publish),
        Commands::Shadow => commands::shadow::execute(config),
        Commands::Reindex { id } => commands::reindex::execute(config, &id),
        Commands::Publish { all, files } => commands::publish::execute(config, all, files),
        Commands::Commit => commands::publish::commit(config),
        Commands::Optimize => commands::publish::optimize(config),
        Commands::Stats => commands::stats::execute(config),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    media_indexer::cancel::install_signal_handlers();

    let config_display = cli.config.display().to_string();
    let exit_code = match dispatch(cli) {
        Ok(code) => code,
        Err(e) => match lock_holder(&e) {
            Some(pid) => {
                eprintln!(
                    "Another instance of this program (PID {}) is currently running the configuration {}.",
                    pid, config_display
                );
                EXIT_LOCKED
            }
            None => {
                eprintln!("Error: {:#}", e);
                commands::EXIT_ERRORS
            }
        },
    };
    std::process::exit(exit_code);
}
