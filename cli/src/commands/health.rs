//! `termdock health` — one-shot terminal readiness check.

use anyhow::Result;

use crate::app::AppContext;
use crate::application::services::monitor::health_check;
use crate::commands::{load_config, terminal_descriptor};
use crate::output::progress;

/// Run `termdock health`. Exit 0 when the terminal is ready, 1 otherwise.
///
/// # Errors
///
/// Returns an error when the terminal is not ready, naming what was probed.
pub async fn run(app: &AppContext) -> Result<()> {
    let config = load_config(app)?;
    let desc = terminal_descriptor(&config)?;

    let pb = (app.output.is_tty && !app.output.quiet)
        .then(|| progress::spinner("checking terminal readiness..."));

    let healthy = health_check(&app.engine, &app.net, &desc).await;

    if let Some(pb) = pb {
        if healthy {
            progress::finish_ok(&pb, "terminal is ready");
        } else {
            pb.finish_and_clear();
        }
    } else if healthy {
        app.output.success("terminal is ready");
    }

    if healthy {
        Ok(())
    } else {
        anyhow::bail!(
            "terminal '{}' is not ready (needs the container running and {}:{} reachable)",
            desc.name,
            config.mt5_host,
            config.mt5_port
        )
    }
}
