//! Best-effort host firewall adjustment.
//!
//! Opens the exposed TCP ports through `ufw` when it is installed and
//! active. A missing or inactive firewall manager is not an error — the
//! deployment simply relies on whatever the host already allows.

use crate::application::ports::{CommandRunner, ProgressReporter};

/// Allow each port through `ufw`, skipping silently when `ufw` is absent or
/// reports an inactive status. Individual `allow` failures are warnings.
pub async fn open_ports(
    runner: &impl CommandRunner,
    reporter: &impl ProgressReporter,
    ports: &[u16],
) {
    let status = match runner.run("ufw", &["status"]).await {
        Ok(output) if output.status.success() => {
            String::from_utf8_lossy(&output.stdout).into_owned()
        }
        _ => {
            reporter.step("ufw not available; skipping firewall configuration");
            return;
        }
    };

    if !status.contains("Status: active") {
        reporter.step("ufw inactive; skipping firewall configuration");
        return;
    }

    for port in ports {
        let rule = format!("{port}/tcp");
        match runner.run("ufw", &["allow", &rule]).await {
            Ok(output) if output.status.success() => {
                reporter.step(&format!("firewall: allowed {rule}"));
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                reporter.warn(&format!("firewall: could not allow {rule}: {}", stderr.trim()));
            }
            Err(e) => reporter.warn(&format!("firewall: could not allow {rule}: {e:#}")),
        }
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
