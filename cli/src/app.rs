//! Application context — unified state passed to every command handler.
//!
//! `AppContext` wires the production infrastructure once (engine adapter,
//! command runner, network probe, prompter) so command handlers stay thin.

use std::path::PathBuf;

use anyhow::Result;

use crate::infra::command_runner::{DEFAULT_CMD_TIMEOUT, TokioCommandRunner};
use crate::infra::docker::DockerEngine;
use crate::infra::network::TokioNetworkProbe;
use crate::infra::prompt::TerminalInteraction;
use crate::output::OutputContext;
use crate::output::reporter::TerminalReporter;

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Skip interactive prompts (also set by `CI` / `TERMDOCK_YES` env vars).
    pub yes: bool,
    /// Data directory override (`--data-dir` / `TERMDOCK_HOME`).
    pub data_dir: Option<PathBuf>,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Container engine adapter.
    pub engine: DockerEngine<TokioCommandRunner>,
    /// Process runner for non-engine commands (firewall, editor).
    pub runner: TokioCommandRunner,
    /// TCP readiness probe.
    pub net: TokioNetworkProbe,
    /// Interactivity capability for prompts.
    pub interaction: TerminalInteraction,
    /// Directory holding the manifest, env file, and terminal config.
    pub data_dir: PathBuf,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if no data directory was given and the home
    /// directory cannot be determined.
    pub fn new(flags: AppFlags) -> Result<Self> {
        let data_dir = match flags.data_dir {
            Some(dir) => dir,
            None => dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?
                .join(".termdock"),
        };

        Ok(Self {
            output: OutputContext::new(flags.no_color, flags.quiet),
            engine: DockerEngine::default_runner(),
            runner: TokioCommandRunner::new(DEFAULT_CMD_TIMEOUT),
            net: TokioNetworkProbe,
            interaction: TerminalInteraction::new(flags.yes),
            data_dir,
        })
    }

    /// Progress reporter bound to this context's output settings.
    #[must_use]
    pub fn terminal_reporter(&self) -> TerminalReporter<'_> {
        TerminalReporter::new(&self.output)
    }

    /// Path of the fetched service manifest.
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        crate::application::services::provision::manifest_path(&self.data_dir)
    }
}
