//! CLI argument parsing with clap derive

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags};
use crate::commands;

/// Provisioned Docker environments for MT5 trading terminals
#[derive(Parser)]
#[command(
    name = "termdock",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Directory holding the manifest, env file, and terminal config
    #[arg(long, global = true, env = "TERMDOCK_HOME", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Provision the environment and bring all services up
    Up(commands::up::UpArgs),

    /// Show each declared service's observed state
    Status,

    /// Restart the terminal container and wait for readiness
    Restart,

    /// One-shot terminal readiness check
    Health,

    /// Supervise the terminal: scheduled restarts and recovery
    Monitor,

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails; `main` maps it to exit code 1.
    pub async fn run(self) -> Result<()> {
        let Cli {
            json,
            quiet,
            no_color,
            data_dir,
            command,
        } = self;

        if let Command::Version = command {
            return commands::version::run(json);
        }

        let yes = match &command {
            Command::Up(args) => args.yes,
            _ => false,
        };
        let app = AppContext::new(AppFlags {
            no_color,
            quiet,
            yes,
            data_dir,
        })?;

        match command {
            Command::Up(args) => commands::up::run(&args, &app).await,
            Command::Status => commands::status::run(&app, json).await,
            Command::Restart => commands::restart::run(&app).await,
            Command::Health => commands::health::run(&app).await,
            Command::Monitor => commands::monitor::run(&app).await,
            Command::Version => unreachable!("handled above"),
        }
    }
}
