//! Activity import CLI - bring broker exports into your portfolio

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod output;

use commands::{check, import, inspect, profiles};

/// aimp - map, validate and import activity files
#[derive(Parser)]
#[command(name = "aimp", version, about, long_about = None)]
struct Cli {
    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what a file contains and how its columns would be mapped
    Inspect {
        /// Path to a .csv or .json file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a file against the import API without importing
    Check {
        #[command(flatten)]
        args: check::PipelineArgs,
    },

    /// Validate a file, then import the valid activities
    Import {
        #[command(flatten)]
        args: check::PipelineArgs,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// List saved import profiles
    Profiles {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Inspect { file, json } => inspect::run(&file, json).await,
        Commands::Check { args } => check::run(args).await,
        Commands::Import { args, yes } => import::run(args, yes).await,
        Commands::Profiles { json } => profiles::run(json),
    }
}

/// Install the log subscriber; also receives records from the `log` facade
///
/// `RUST_LOG` wins over `--verbose`. `AIMP_LOG_FORMAT=json` switches to JSON lines.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let log_format = std::env::var("AIMP_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
