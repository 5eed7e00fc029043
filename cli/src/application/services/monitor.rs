//! Terminal supervision: one-shot health checks, on-demand restart, and the
//! long-running monitor loop with scheduled and recovery restarts.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::application::ports::{
    ContainerControl, NetworkProbe, ProgressReporter, RestartNotifier,
};
use crate::application::services::launcher::wait_ready;
use crate::domain::service::{ReadinessProbe, ServiceDescriptor};

/// Monitor cadence: restart the terminal every 12 hours, poll health every
/// 5 minutes in between.
#[derive(Debug, Clone, Copy)]
pub struct MonitorSettings {
    pub restart_interval: Duration,
    pub poll_interval: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            restart_interval: Duration::from_secs(12 * 3600),
            poll_interval: Duration::from_secs(5 * 60),
        }
    }
}

/// What the monitor loop decided to do for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorAction {
    /// The scheduled restart interval elapsed.
    ScheduledRestart,
    /// The service looked unhealthy and needs a recovery restart.
    RecoveryRestart,
    /// Healthy and within the restart interval.
    None,
}

/// Pure tick decision: scheduled restart wins over recovery.
#[must_use]
pub fn next_action(
    since_last_restart: Duration,
    healthy: bool,
    settings: &MonitorSettings,
) -> MonitorAction {
    if since_last_restart >= settings.restart_interval {
        MonitorAction::ScheduledRestart
    } else if healthy {
        MonitorAction::None
    } else {
        MonitorAction::RecoveryRestart
    }
}

/// One-shot health check: every probe on the descriptor must pass once.
pub async fn health_check(
    engine: &impl ContainerControl,
    net: &impl NetworkProbe,
    desc: &ServiceDescriptor,
) -> bool {
    for probe in &desc.probes {
        let ok = match probe {
            ReadinessProbe::Tcp { host, port } => {
                net.check_tcp(host, *port).await.unwrap_or(false)
            }
            ReadinessProbe::Container { name } => match engine.running_names(name).await {
                Ok(output) if output.status.success() => String::from_utf8_lossy(&output.stdout)
                    .lines()
                    .any(|line| line.trim().contains(name)),
                _ => false,
            },
        };
        if !ok {
            return false;
        }
    }
    true
}

/// Restart the terminal container, wait for it to become ready again, then
/// notify the trading engine so it re-establishes its bridge connection.
/// The notification is best-effort: failures are warnings.
///
/// # Errors
///
/// Returns an error if the restart command fails or the service does not
/// become ready within its retry budget.
pub async fn restart_terminal(
    engine: &impl ContainerControl,
    net: &impl NetworkProbe,
    notifier: &impl RestartNotifier,
    reporter: &impl ProgressReporter,
    desc: &ServiceDescriptor,
) -> Result<()> {
    reporter.step(&format!("restarting '{}'...", desc.name));
    let output = engine
        .restart(&desc.container)
        .await
        .with_context(|| format!("restarting container '{}'", desc.container))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "failed to restart container '{}': {}",
            desc.container,
            stderr.trim()
        );
    }

    reporter.step(&format!("waiting for '{}' to become ready...", desc.name));
    wait_ready(engine, net, desc).await?;
    reporter.success(&format!("service '{}' restarted", desc.name));

    if let Err(e) = notifier.notify_restart(&desc.name) {
        reporter.warn(&format!("could not notify trading engine: {e:#}"));
    }
    Ok(())
}

/// Supervision loop: sleeps `poll_interval` between ticks, restarts on
/// schedule or on failed health checks, and stops on Ctrl-C. A failed
/// restart is logged and retried on the next tick rather than aborting the
/// loop.
///
/// # Errors
///
/// Returns an error only if waiting for the interrupt signal fails.
pub async fn monitor_loop(
    engine: &impl ContainerControl,
    net: &impl NetworkProbe,
    notifier: &impl RestartNotifier,
    reporter: &impl ProgressReporter,
    desc: &ServiceDescriptor,
    settings: MonitorSettings,
) -> Result<()> {
    reporter.step(&format!(
        "monitoring '{}' (health every {}s, restart every {}h); Ctrl-C to stop",
        desc.name,
        settings.poll_interval.as_secs(),
        settings.restart_interval.as_secs() / 3600,
    ));

    let mut last_restart = Instant::now();
    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("waiting for interrupt signal")?;
                reporter.step("monitoring stopped");
                return Ok(());
            }
            () = tokio::time::sleep(settings.poll_interval) => {}
        }

        let healthy = health_check(engine, net, desc).await;
        match next_action(last_restart.elapsed(), healthy, &settings) {
            MonitorAction::None => {}
            action => {
                match action {
                    MonitorAction::ScheduledRestart => {
                        reporter.step("scheduled restart interval reached");
                    }
                    MonitorAction::RecoveryRestart => {
                        reporter.warn(&format!("service '{}' unhealthy; restarting", desc.name));
                    }
                    MonitorAction::None => {}
                }
                match restart_terminal(engine, net, notifier, reporter, desc).await {
                    Ok(()) => last_restart = Instant::now(),
                    Err(e) => reporter.warn(&format!("restart failed: {e:#}")),
                }
            }
        }
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
