//! Post-launch customization of a running service.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use crate::application::ports::{ContainerControl, NetworkProbe, ProgressReporter};
use crate::application::services::launcher::wait_ready;
use crate::domain::customize::{CustomizationOutcome, CustomizationStep};
use crate::domain::error::CustomizeError;
use crate::domain::service::{LaunchReport, ServiceDescriptor};

/// Apply the declared steps, in order, to a service the launch report marks
/// `Ready`. The first failing step aborts the remainder and is named in the
/// error. A `Restart` step is followed by a fresh bounded readiness wait —
/// the service is not customized-and-ready until the post-restart probes
/// pass.
///
/// # Errors
///
/// [`CustomizeError::NotReady`] when the precondition fails (no steps run);
/// [`CustomizeError::StepFailed`] naming the step and cause otherwise.
pub async fn customize(
    engine: &impl ContainerControl,
    net: &impl NetworkProbe,
    reporter: &impl ProgressReporter,
    report: &LaunchReport,
    desc: &ServiceDescriptor,
    steps: &[CustomizationStep],
) -> Result<CustomizationOutcome, CustomizeError> {
    if !report.is_ready(&desc.name) {
        return Err(CustomizeError::NotReady {
            service: desc.name.clone(),
        });
    }

    let mut restarted = false;
    for (i, step) in steps.iter().enumerate() {
        let index = i + 1;
        reporter.step(&format!("customizing '{}': {}", desc.name, step.describe()));
        run_step(engine, desc, step)
            .await
            .map_err(|reason| CustomizeError::StepFailed {
                service: desc.name.clone(),
                index,
                step: step.describe(),
                reason,
            })?;

        if matches!(step, CustomizationStep::Restart) {
            restarted = true;
            reporter.step(&format!(
                "waiting for '{}' to become ready after restart...",
                desc.name
            ));
            wait_ready(engine, net, desc)
                .await
                .map_err(|timeout| CustomizeError::StepFailed {
                    service: desc.name.clone(),
                    index,
                    step: step.describe(),
                    reason: timeout.to_string(),
                })?;
        }
    }

    reporter.success(&format!("service '{}' customized", desc.name));
    Ok(CustomizationOutcome {
        service: desc.name.clone(),
        steps_run: steps.len(),
        restarted,
    })
}

async fn run_step(
    engine: &impl ContainerControl,
    desc: &ServiceDescriptor,
    step: &CustomizationStep,
) -> Result<(), String> {
    let result = match step {
        CustomizationStep::CopyIn { local, dest } => {
            engine.copy_in(local, &desc.container, dest).await
        }
        CustomizationStep::Exec { argv } => {
            let refs: Vec<&str> = argv.iter().map(String::as_str).collect();
            engine.exec(&desc.container, &refs).await
        }
        CustomizationStep::Restart => engine.restart(&desc.container).await,
    };
    match result {
        Ok(output) if output.status.success() => Ok(()),
        Ok(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            if stderr.is_empty() {
                Err(format!("exited with {}", output.status))
            } else {
                Err(stderr.to_string())
            }
        }
        Err(e) => Err(format!("{e:#}")),
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
