//! `termdock restart` — restart the terminal container on demand, wait for
//! readiness, and notify the trading engine.

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::monitor::restart_terminal;
use crate::application::services::provision::API_PORT;
use crate::commands::{load_config, terminal_descriptor};
use crate::infra::notify::HttpNotifier;

/// Run `termdock restart`.
///
/// # Errors
///
/// Returns an error if the restart fails or the terminal does not become
/// ready again within its retry budget.
pub async fn run(app: &AppContext) -> Result<()> {
    let config = load_config(app)?;
    let desc = terminal_descriptor(&config)?;
    let notifier = HttpNotifier::for_host(&config.mt5_host, API_PORT);

    restart_terminal(
        &app.engine,
        &app.net,
        &notifier,
        &app.terminal_reporter(),
        &desc,
    )
    .await
}
