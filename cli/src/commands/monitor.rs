//! `termdock monitor` — supervise the terminal with scheduled restarts and
//! automatic recovery.

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::monitor::{MonitorSettings, monitor_loop};
use crate::application::services::provision::API_PORT;
use crate::commands::{load_config, terminal_descriptor};
use crate::infra::notify::HttpNotifier;

/// Run `termdock monitor` until interrupted.
///
/// # Errors
///
/// Returns an error only if waiting for the interrupt signal fails.
pub async fn run(app: &AppContext) -> Result<()> {
    let config = load_config(app)?;
    let desc = terminal_descriptor(&config)?;
    let notifier = HttpNotifier::for_host(&config.mt5_host, API_PORT);

    monitor_loop(
        &app.engine,
        &app.net,
        &notifier,
        &app.terminal_reporter(),
        &desc,
        MonitorSettings::default(),
    )
    .await
}
