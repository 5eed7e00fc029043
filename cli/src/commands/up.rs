//! `termdock up` — resolve configuration, reconcile resources, bring the
//! services up, and customize the terminal.

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::provision::{
    self, API_PORT, GRAPHICAL_PORT, ProvisionOptions, RunSummary,
};
use crate::domain::config::Overrides;
use crate::infra::fetch::UreqFetcher;
use crate::infra::fs::StdFs;
use crate::output::OutputContext;

/// Arguments for the up command. Every flag is optional; unset keys fall
/// back to the persisted file and then to the documented defaults.
#[derive(Args, Default)]
pub struct UpArgs {
    /// Trading-engine license key
    #[arg(long, value_name = "KEY")]
    pub license_key: Option<String>,

    /// MT5 account login
    #[arg(long)]
    pub login: Option<String>,

    /// MT5 account password
    #[arg(long)]
    pub password: Option<String>,

    /// MT5 broker server name
    #[arg(long, value_name = "NAME")]
    pub server: Option<String>,

    /// Secret key for the trading-engine API
    #[arg(long, value_name = "KEY")]
    pub secret_key: Option<String>,

    /// Host the services bind and are probed on
    #[arg(long)]
    pub host: Option<String>,

    /// Remote-control port of the terminal
    #[arg(long, value_name = "PORT")]
    pub mt5_port: Option<String>,

    /// Skip interactive prompts
    #[arg(short, long)]
    pub yes: bool,
}

impl UpArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            license_key: self.license_key.clone(),
            login: self.login.clone(),
            password: self.password.clone(),
            server: self.server.clone(),
            host: self.host.clone(),
            port: self.mt5_port.clone(),
            secret_key: self.secret_key.clone(),
        }
    }
}

/// Run `termdock up`.
///
/// # Errors
///
/// Returns an error (non-zero exit) for malformed configuration, missing
/// engine prerequisites, a required service that never became ready, or a
/// failed terminal customization.
pub async fn run(args: &UpArgs, app: &AppContext) -> Result<()> {
    let reporter = app.terminal_reporter();
    let opts = ProvisionOptions {
        overrides: args.overrides(),
        data_dir: app.data_dir.clone(),
    };

    let summary = provision::provision(
        &app.engine,
        &app.runner,
        &UreqFetcher::default(),
        &StdFs,
        &app.net,
        &app.interaction,
        &reporter,
        &opts,
    )
    .await?;

    print_summary(&summary, &app.output);
    Ok(())
}

fn print_summary(summary: &RunSummary, ctx: &OutputContext) {
    if ctx.quiet {
        return;
    }
    ctx.success("Environment ready.");
    ctx.kv("Config", &summary.env_path.display().to_string());
    ctx.kv(
        "API",
        &format!("http://{}:{API_PORT}", summary.config.mt5_host),
    );
    ctx.kv(
        "Terminal",
        &format!("{}:{}", summary.config.mt5_host, summary.config.mt5_port),
    );
    ctx.kv(
        "Graphical",
        &format!("http://{}:{GRAPHICAL_PORT}", summary.config.mt5_host),
    );
    let elapsed = (summary.finished_at - summary.started_at).num_seconds();
    ctx.kv("Elapsed", &format!("{elapsed}s"));
}
