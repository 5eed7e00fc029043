//! `termdock status` — show each declared service's observed state.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::app::AppContext;
use crate::application::ports::ComposeControl;

/// One service row, as shown by `status` (and serialized for `--json`).
#[derive(Debug, Serialize)]
pub struct StatusEntry {
    pub service: String,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<String>,
}

/// Run `termdock status`.
///
/// # Errors
///
/// Returns an error if the manifest is missing or the engine cannot be
/// queried.
pub async fn run(app: &AppContext, json: bool) -> Result<()> {
    let manifest = app.manifest_path();
    if !manifest.exists() {
        anyhow::bail!(
            "no service manifest at {}.\n\nRun 'termdock up' first.",
            manifest.display()
        );
    }

    let output = app
        .engine
        .compose_ps(&manifest)
        .await
        .context("querying services")?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("could not query services: {}", stderr.trim());
    }

    let entries = parse_entries(&String::from_utf8_lossy(&output.stdout));

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&entries).context("serializing status")?
        );
        return Ok(());
    }

    if entries.is_empty() {
        app.output.info("No services running. Run 'termdock up'.");
        return Ok(());
    }
    app.output.header("Services");
    for entry in &entries {
        let value = match &entry.health {
            Some(health) => format!("{} ({health})", entry.state),
            None => entry.state.clone(),
        };
        app.output.kv(&entry.service, &value);
    }
    Ok(())
}

/// Parse `compose ps --format json` output (one JSON object per line).
fn parse_entries(stdout: &str) -> Vec<StatusEntry> {
    let mut entries = Vec::new();
    for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
        let Ok(entry) = serde_json::from_str::<serde_json::Value>(line) else {
            continue;
        };
        let service = entry
            .get("Service")
            .or_else(|| entry.get("Name"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();
        let state = entry
            .get("State")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();
        let health = entry
            .get("Health")
            .and_then(|v| v.as_str())
            .filter(|h| !h.is_empty())
            .map(String::from);
        entries.push(StatusEntry {
            service,
            state,
            health,
        });
    }
    entries
}
