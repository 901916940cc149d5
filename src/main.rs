//! # Journal Mentor CLI (`mentor`)
//!
//! Intended to be run once a day by an external scheduler (cron, CI).
//!
//! ## Usage
//!
//! ```bash
//! mentor --config ./config/mentor.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `mentor run` | Resolve today's entry, generate feedback, append it |
//! | `mentor run --dry-run` | Same, but print the feedback instead of writing |
//! | `mentor schema` | Show the journal database properties |
//!
//! Exit status is 0 on success and on every "nothing to do" outcome,
//! 1 on any failure.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use journal_mentor::{config, run, schema};

const DEFAULT_CONFIG: &str = "./config/mentor.toml";

/// Journal Mentor: scheduled mentor feedback for a daily Notion journal.
#[derive(Parser)]
#[command(
    name = "mentor",
    about = "Journal Mentor: scheduled mentor feedback for a daily Notion journal",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/mentor.toml`; when that file does not exist,
    /// built-in defaults and environment variables are used.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (`-v` debug, `-vv` trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate feedback for today's journal entry.
    ///
    /// Finds or creates today's entry, sends it to the model and appends
    /// the reply as a new collapsible block. Does nothing before the
    /// configured cutoff date.
    Run {
        /// Print the feedback instead of writing it; never creates an entry.
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the journal database's properties and the date strategy.
    Schema,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("journal_mentor={level},journal_mentor_core={level}"))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = match &cli.config {
        Some(path) => config::load_config(path, true)?,
        None => config::load_config(&PathBuf::from(DEFAULT_CONFIG), false)?,
    };

    match cli.command {
        Commands::Run { dry_run } => {
            run::run_feedback(&cfg, dry_run).await?;
        }
        Commands::Schema => {
            schema::run_schema(&cfg).await?;
        }
    }

    Ok(())
}
