//! Courier Telemetry CLI - Command-line interface
//!
//! This binary exercises the Courier Telemetry library: backend discovery,
//! trace replay through a tracking session, and configuration management.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use courier_telemetry::config::config_file_path;

use commands::config::ConfigCommands;
use commands::replay::ReplayArgs;
use commands::session::SessionCommands;
use error::CliError;
use runner::CliRunner;

#[derive(Parser)]
#[command(name = "courier-telemetry")]
#[command(version)]
#[command(about = "Courier location telemetry tools", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.courier-telemetry/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the first reachable backend and check that it answers
    Probe,

    /// Replay a recorded location trace through a tracking session
    Replay {
        /// JSON lines trace file
        trace: PathBuf,

        /// Entity (order or rider) to report positions for
        #[arg(long)]
        entity: String,

        /// Capture interval in milliseconds (overrides tracking.polling_interval_ms)
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Run the session without pushing to the backend
        #[arg(long)]
        offline: bool,
    },

    /// Inspect the resumable tracking session record
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },

    /// View or modify configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = dispatch(cli).await {
        e.exit();
    }
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Config { command } => {
            let path = cli.config.unwrap_or_else(config_file_path);
            commands::config::run(command, &path)
        }
        Commands::Probe => {
            let runner = CliRunner::new(cli.config.as_deref(), cli.debug)?;
            commands::probe::run(&runner).await
        }
        Commands::Replay {
            trace,
            entity,
            interval_ms,
            offline,
        } => {
            let runner = CliRunner::new(cli.config.as_deref(), cli.debug)?;
            let args = ReplayArgs {
                trace,
                entity,
                interval_ms,
                offline,
            };
            commands::replay::run(args, &runner).await
        }
        Commands::Session { command } => {
            let runner = CliRunner::new(cli.config.as_deref(), cli.debug)?;
            commands::session::run(command, &runner)
        }
    }
}
