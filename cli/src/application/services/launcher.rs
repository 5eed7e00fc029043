//! Service bring-up: start triggers plus bounded readiness polling.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//!
//! Per-service state machine: `NotStarted → Starting → (Ready | Failed)`.
//! Issuing the start trigger is the one inherently non-idempotent side effect
//! of a run; the trigger used here (`compose up -d <service>`) is a no-op for
//! a service that is already running, so re-executing a run never bounces a
//! healthy service. Restarting is a distinct, explicit operation owned by the
//! customizer.

use std::path::Path;

use crate::application::ports::{ContainerControl, ContainerEngine, NetworkProbe, ProgressReporter};
use crate::domain::error::LaunchTimeout;
use crate::domain::service::{
    LaunchReport, ReadinessProbe, ServiceDescriptor, ServiceOutcome, ServiceState,
};

/// Bring up every declared service in order and wait for each to become
/// ready within its bounded retry budget.
///
/// A `Failed` service does not abort the sequence — later services are
/// independent and still get their chance; only customization depends on
/// `Ready`. The report enumerates each service's terminal state.
pub async fn launch_all(
    engine: &impl ContainerEngine,
    net: &impl NetworkProbe,
    reporter: &impl ProgressReporter,
    manifest: &Path,
    descriptors: &[ServiceDescriptor],
) -> LaunchReport {
    let mut services = Vec::with_capacity(descriptors.len());
    for desc in descriptors {
        let mut outcome = ServiceOutcome {
            name: desc.name.clone(),
            state: ServiceState::NotStarted,
            attempts: 0,
            required: desc.required,
            error: None,
        };

        reporter.step(&format!("starting service '{}'...", desc.name));
        match trigger_start(engine, manifest, desc).await {
            Err(reason) => {
                reporter.warn(&format!("service '{}': {reason}", desc.name));
                outcome.state = ServiceState::Failed;
                outcome.error = Some(reason);
            }
            Ok(()) => {
                outcome.state = ServiceState::Starting;
                match wait_ready(engine, net, desc).await {
                    Ok(attempts) => {
                        reporter.success(&format!("service '{}' ready", desc.name));
                        outcome.state = ServiceState::Ready;
                        outcome.attempts = attempts;
                    }
                    Err(timeout) => {
                        reporter.warn(&timeout.to_string());
                        outcome.state = ServiceState::Failed;
                        outcome.attempts = timeout.attempts;
                        outcome.error = Some(timeout.to_string());
                    }
                }
            }
        }
        services.push(outcome);
    }
    LaunchReport { services }
}

/// Poll the descriptor's probes at a fixed interval until they all pass or
/// the attempt budget is spent. Returns the number of attempts used.
///
/// # Errors
///
/// Returns [`LaunchTimeout`] carrying the last probe failure when the budget
/// is exhausted — exactly at `max_attempts`, never earlier.
pub async fn wait_ready(
    engine: &impl ContainerControl,
    net: &impl NetworkProbe,
    desc: &ServiceDescriptor,
) -> Result<u32, LaunchTimeout> {
    let mut last_probe = String::from("no probe attempted");
    for attempt in 1..=desc.retry.max_attempts {
        match check_probes(engine, net, desc).await {
            Ok(()) => return Ok(attempt),
            Err(reason) => last_probe = reason,
        }
        if attempt < desc.retry.max_attempts {
            tokio::time::sleep(desc.retry.interval).await;
        }
    }
    Err(LaunchTimeout {
        service: desc.name.clone(),
        attempts: desc.retry.max_attempts,
        elapsed_secs: desc.retry.timeout().as_secs(),
        last_probe,
    })
}

/// One probing attempt: every probe on the descriptor must pass.
async fn check_probes(
    engine: &impl ContainerControl,
    net: &impl NetworkProbe,
    desc: &ServiceDescriptor,
) -> Result<(), String> {
    for probe in &desc.probes {
        let ok = match probe {
            ReadinessProbe::Tcp { host, port } => match net.check_tcp(host, *port).await {
                Ok(ok) => ok,
                Err(e) => return Err(format!("{probe}: {e:#}")),
            },
            ReadinessProbe::Container { name } => match container_running(engine, name).await {
                Ok(ok) => ok,
                Err(e) => return Err(format!("{probe}: {e:#}")),
            },
        };
        if !ok {
            return Err(format!("{probe}: not ready"));
        }
    }
    Ok(())
}

async fn trigger_start(
    engine: &impl ContainerEngine,
    manifest: &Path,
    desc: &ServiceDescriptor,
) -> Result<(), String> {
    match engine.compose_up(manifest, &desc.compose_service).await {
        Ok(output) if output.status.success() => Ok(()),
        Ok(output) => Err(format!(
            "start trigger failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )),
        Err(e) => Err(format!("start trigger failed: {e:#}")),
    }
}

async fn container_running(engine: &impl ContainerControl, name: &str) -> anyhow::Result<bool> {
    let output = engine.running_names(name).await?;
    if !output.status.success() {
        return Ok(false);
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.lines().any(|line| line.trim().contains(name)))
}

// ── Unit tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::cell::Cell;
    use std::path::PathBuf;
    use std::time::Duration;

    use anyhow::Result;

    use super::*;
    use crate::application::ports::{ComposeControl, EngineInspector};
    use crate::application::services::test_support::{
        ReporterStub, err_output, impl_engine_stubs, ok_output,
    };
    use crate::domain::service::RetryPolicy;

    fn tcp_descriptor(max_attempts: u32) -> ServiceDescriptor {
        ServiceDescriptor {
            name: "mt5".to_string(),
            compose_service: "mt5".to_string(),
            container: "mt5".to_string(),
            probes: vec![ReadinessProbe::Tcp {
                host: "localhost".to_string(),
                port: 8002,
            }],
            retry: RetryPolicy {
                max_attempts,
                interval: Duration::ZERO,
            },
            required: true,
        }
    }

    /// Engine that accepts every start trigger and reports the container
    /// running.
    struct EngineHappy;

    impl ComposeControl for EngineHappy {
        async fn compose_up(&self, _: &Path, _: &str) -> Result<std::process::Output> {
            Ok(ok_output(b""))
        }
        impl_engine_stubs!(compose_ps);
    }
    impl ContainerControl for EngineHappy {
        async fn running_names(&self, filter: &str) -> Result<std::process::Output> {
            Ok(ok_output(format!("{filter}\n").as_bytes()))
        }
        impl_engine_stubs!(restart, exec, copy_in);
    }
    impl EngineInspector for EngineHappy {
        impl_engine_stubs!(server_version, compose_version);
    }

    /// Engine whose start trigger fails; probes must never be consulted.
    struct EngineTriggerFails {
        probed: Cell<bool>,
    }

    impl ComposeControl for EngineTriggerFails {
        async fn compose_up(&self, _: &Path, _: &str) -> Result<std::process::Output> {
            Ok(err_output(1, b"no such service: mt5"))
        }
        impl_engine_stubs!(compose_ps);
    }
    impl ContainerControl for EngineTriggerFails {
        async fn running_names(&self, _: &str) -> Result<std::process::Output> {
            self.probed.set(true);
            Ok(ok_output(b""))
        }
        impl_engine_stubs!(restart, exec, copy_in);
    }
    impl EngineInspector for EngineTriggerFails {
        impl_engine_stubs!(server_version, compose_version);
    }

    /// TCP probe that succeeds from the Nth call on.
    struct ProbeNth {
        calls: Cell<u32>,
        ready_at: u32,
    }

    impl ProbeNth {
        fn new(ready_at: u32) -> Self {
            Self {
                calls: Cell::new(0),
                ready_at,
            }
        }
    }

    impl NetworkProbe for ProbeNth {
        async fn check_tcp(&self, _: &str, _: u16) -> Result<bool> {
            let n = self.calls.get() + 1;
            self.calls.set(n);
            Ok(n >= self.ready_at)
        }
    }

    struct ProbeNever;
    impl NetworkProbe for ProbeNever {
        async fn check_tcp(&self, _: &str, _: u16) -> Result<bool> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn wait_ready_succeeds_on_nth_attempt() {
        let desc = tcp_descriptor(10);
        let probe = ProbeNth::new(4);
        let attempts = wait_ready(&EngineHappy, &probe, &desc).await.expect("ready");
        assert_eq!(attempts, 4);
        assert_eq!(probe.calls.get(), 4, "no probing after success");
    }

    #[tokio::test]
    async fn wait_ready_fails_exactly_at_attempt_budget() {
        let desc = tcp_descriptor(5);
        let probe = ProbeNever;
        let timeout = wait_ready(&EngineHappy, &probe, &desc)
            .await
            .expect_err("expected timeout");
        assert_eq!(timeout.attempts, 5);
        assert_eq!(timeout.service, "mt5");
        assert!(timeout.last_probe.contains("8002"), "got: {}", timeout.last_probe);
    }

    #[tokio::test]
    async fn wait_ready_budget_is_not_cut_short_by_late_success() {
        // Success one attempt past the budget must not be observed.
        let desc = tcp_descriptor(3);
        let probe = ProbeNth::new(4);
        assert!(wait_ready(&EngineHappy, &probe, &desc).await.is_err());
        assert_eq!(probe.calls.get(), 3, "exactly max_attempts probes");
    }

    #[tokio::test]
    async fn launch_all_reports_ready_service() {
        let desc = tcp_descriptor(3);
        let report = launch_all(
            &EngineHappy,
            &ProbeNth::new(1),
            &ReporterStub,
            &PathBuf::from("/data/docker-compose.yml"),
            &[desc],
        )
        .await;
        assert!(report.is_ready("mt5"));
        assert!(report.failed_required().is_empty());
    }

    #[tokio::test]
    async fn launch_all_trigger_failure_skips_probing() {
        let engine = EngineTriggerFails {
            probed: Cell::new(false),
        };
        let mut desc = tcp_descriptor(3);
        desc.probes = vec![ReadinessProbe::Container {
            name: "mt5".to_string(),
        }];
        let report = launch_all(
            &engine,
            &ProbeNever,
            &ReporterStub,
            &PathBuf::from("/data/docker-compose.yml"),
            &[desc],
        )
        .await;
        let outcome = &report.services[0];
        assert_eq!(outcome.state, ServiceState::Failed);
        assert_eq!(outcome.attempts, 0);
        assert!(
            outcome.error.as_deref().unwrap_or_default().contains("no such service"),
            "trigger stderr must be surfaced"
        );
        assert!(!engine.probed.get(), "probes must not run after trigger failure");
    }

    #[tokio::test]
    async fn launch_all_continues_past_failed_service() {
        let failed = tcp_descriptor(2);
        let mut ok = tcp_descriptor(2);
        ok.name = "api".to_string();
        ok.compose_service = "api".to_string();
        ok.probes = vec![ReadinessProbe::Container {
            name: "api".to_string(),
        }];

        let report = launch_all(
            &EngineHappy,
            &ProbeNever,
            &ReporterStub,
            &PathBuf::from("/data/docker-compose.yml"),
            &[failed, ok],
        )
        .await;
        assert!(!report.is_ready("mt5"));
        assert!(report.is_ready("api"), "independent services still launch");
    }

    #[tokio::test]
    async fn container_probe_matches_engine_listing() {
        let mut desc = tcp_descriptor(1);
        desc.probes = vec![ReadinessProbe::Container {
            name: "mt5".to_string(),
        }];
        let attempts = wait_ready(&EngineHappy, &ProbeNever, &desc).await.expect("ready");
        assert_eq!(attempts, 1);
    }
}
