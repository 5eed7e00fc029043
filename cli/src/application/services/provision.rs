//! The full provisioning run: resolve configuration, reconcile resources,
//! bring services up, customize the terminal. Strictly sequential, no
//! branching back between stages.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::application::ports::{
    AssetFetcher, CommandRunner, ContainerEngine, EngineInspector, Interaction, LocalFs,
    NetworkProbe, ProgressReporter,
};
use crate::application::services::{customizer, firewall, launcher};
use crate::domain::config::{Overrides, ProvisioningConfig, parse_env_file, resolve};
use crate::domain::customize::{CustomizationOutcome, CustomizationStep};
use crate::domain::error::FetchError;
use crate::domain::resource::{ContentPolicy, FetchedFormat, ResourceKind, ResourceSpec};
use crate::domain::service::{LaunchReport, ReadinessProbe, RetryPolicy, ServiceDescriptor};

// ── Constants ────────────────────────────────────────────────────────────────

/// Trading-engine API port.
pub const API_PORT: u16 = 5001;
/// Graphical (VNC) access port for the terminal container.
pub const GRAPHICAL_PORT: u16 = 3000;
/// Compose service name of the terminal container.
pub const TERMINAL_SERVICE: &str = "mt5";
/// Compose service name of the trading-engine API.
pub const API_SERVICE: &str = "api";

/// Remote template location for the service manifest. Authored out-of-band
/// and treated as an opaque input beyond the YAML well-formedness check.
const COMPOSE_TEMPLATE_URL: &str =
    "https://raw.githubusercontent.com/termdock/deploy-templates/main/docker-compose.yml";
/// Remote container image configuration for the terminal.
const IMAGE_CONFIG_URL: &str =
    "https://raw.githubusercontent.com/termdock/deploy-templates/main/mt5-image.json";

/// Where the generated terminal settings land inside the container (the
/// terminal runs under wine).
const TERMINAL_SETTINGS_DEST: &str =
    "/config/.wine/drive_c/Program Files/MetaTrader 5/Config/terminal-settings.ini";

const API_RETRY: RetryPolicy = RetryPolicy {
    max_attempts: 30,
    interval: Duration::from_secs(2),
};
/// Terminal startup under wine is slow; give it a longer budget.
const TERMINAL_RETRY: RetryPolicy = RetryPolicy {
    max_attempts: 24,
    interval: Duration::from_secs(5),
};

const ENGINE_MIN_VERSION: semver::Version = semver::Version::new(20, 10, 0);

// ── Paths ────────────────────────────────────────────────────────────────────

/// Path of the persisted configuration file under the data dir.
#[must_use]
pub fn env_path(data_dir: &Path) -> PathBuf {
    data_dir.join(".env")
}

/// Path of the fetched service manifest under the data dir.
#[must_use]
pub fn manifest_path(data_dir: &Path) -> PathBuf {
    data_dir.join("docker-compose.yml")
}

fn terminal_settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join("mt5").join("terminal-settings.ini")
}

// ── Run options and summary ──────────────────────────────────────────────────

pub struct ProvisionOptions {
    pub overrides: Overrides,
    pub data_dir: PathBuf,
}

/// Outcome of a completed provisioning run.
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub config: ProvisioningConfig,
    pub env_path: PathBuf,
    pub report: LaunchReport,
    pub customization: Option<CustomizationOutcome>,
}

// ── Declarations ─────────────────────────────────────────────────────────────

/// Filesystem resources for one run, in reconciliation order.
#[must_use]
pub fn resource_specs(data_dir: &Path, config: &ProvisioningConfig) -> Vec<ResourceSpec> {
    vec![
        ResourceSpec {
            name: "data directory",
            path: data_dir.to_path_buf(),
            kind: ResourceKind::Directory,
        },
        ResourceSpec {
            name: "terminal config directory",
            path: data_dir.join("mt5"),
            kind: ResourceKind::Directory,
        },
        ResourceSpec {
            name: "service manifest",
            path: manifest_path(data_dir),
            kind: ResourceKind::Fetched {
                url: COMPOSE_TEMPLATE_URL.to_string(),
                policy: ContentPolicy::OverwriteAlways,
                format: FetchedFormat::Yaml,
            },
        },
        ResourceSpec {
            name: "terminal image configuration",
            path: data_dir.join("mt5-image.json"),
            kind: ResourceKind::Fetched {
                url: IMAGE_CONFIG_URL.to_string(),
                policy: ContentPolicy::OverwriteAlways,
                format: FetchedFormat::Json,
            },
        },
        ResourceSpec {
            name: "environment file",
            path: env_path(data_dir),
            kind: ResourceKind::Generated {
                content: config.render_env(),
                policy: ContentPolicy::OverwriteAlways,
                mode: Some(0o600),
            },
        },
        ResourceSpec {
            name: "terminal settings",
            path: terminal_settings_path(data_dir),
            kind: ResourceKind::Generated {
                content: render_terminal_settings(config),
                policy: ContentPolicy::CreateIfAbsent,
                mode: None,
            },
        },
    ]
}

/// First-run defaults for the terminal's remote-control listener.
fn render_terminal_settings(config: &ProvisioningConfig) -> String {
    format!(
        "[Remote]\nEnabled=1\nHost=0.0.0.0\nPort={}\n\n[Server]\nName={}\n",
        config.mt5_port, config.mt5_server
    )
}

/// The declared services, in launch order.
#[must_use]
pub fn service_descriptors(config: &ProvisioningConfig) -> Vec<ServiceDescriptor> {
    vec![
        ServiceDescriptor {
            name: API_SERVICE.to_string(),
            compose_service: API_SERVICE.to_string(),
            container: API_SERVICE.to_string(),
            probes: vec![ReadinessProbe::Tcp {
                host: config.mt5_host.clone(),
                port: API_PORT,
            }],
            retry: API_RETRY,
            required: true,
        },
        ServiceDescriptor {
            name: TERMINAL_SERVICE.to_string(),
            compose_service: TERMINAL_SERVICE.to_string(),
            container: TERMINAL_SERVICE.to_string(),
            probes: vec![
                ReadinessProbe::Container {
                    name: TERMINAL_SERVICE.to_string(),
                },
                ReadinessProbe::Tcp {
                    host: config.mt5_host.clone(),
                    port: config.mt5_port,
                },
            ],
            retry: TERMINAL_RETRY,
            required: true,
        },
    ]
}

/// Customization applied to the terminal once it is ready: push the settings
/// file, install the remote-control bridge, restart, re-verify.
#[must_use]
pub fn terminal_steps(data_dir: &Path) -> Vec<CustomizationStep> {
    vec![
        CustomizationStep::CopyIn {
            local: terminal_settings_path(data_dir),
            dest: TERMINAL_SETTINGS_DEST.to_string(),
        },
        CustomizationStep::Exec {
            argv: vec![
                "pip3".to_string(),
                "install".to_string(),
                "--quiet".to_string(),
                "mt5linux".to_string(),
            ],
        },
        CustomizationStep::Restart,
    ]
}

// ── Stages ───────────────────────────────────────────────────────────────────

/// Stages 1–2: resolve the configuration, then reconcile every declared
/// resource in order. Reconciliation failures are soft: logged, and the run
/// continues with whatever local state exists.
///
/// # Errors
///
/// Only configuration errors are hard here (malformed values abort before
/// any side effect beyond already-reconciled resources).
pub fn resolve_and_reconcile(
    fs: &impl LocalFs,
    fetcher: &impl AssetFetcher,
    reporter: &impl ProgressReporter,
    data_dir: &Path,
    overrides: &Overrides,
) -> Result<ProvisioningConfig> {
    let existing = read_existing_env(fs, reporter, data_dir);
    let config = resolve(overrides, existing.as_ref())?;

    for spec in resource_specs(data_dir, &config) {
        match super::reconciler::reconcile(fs, fetcher, &spec) {
            Ok(result) => reporter.step(&format!("{}: {}", spec.name, result.label())),
            Err(e) if e.downcast_ref::<FetchError>().is_some() => reporter.warn(&format!(
                "{}: {e:#}; continuing with the local copy if present",
                spec.name
            )),
            Err(e) => reporter.warn(&format!("{}: {e:#}", spec.name)),
        }
    }
    Ok(config)
}

fn read_existing_env(
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
    data_dir: &Path,
) -> Option<std::collections::BTreeMap<String, String>> {
    let path = env_path(data_dir);
    if !fs.exists(&path) {
        return None;
    }
    match fs.read(&path) {
        Ok(bytes) => Some(parse_env_file(&String::from_utf8_lossy(&bytes))),
        Err(e) => {
            reporter.warn(&format!(
                "could not read existing {}: {e:#}; using defaults",
                path.display()
            ));
            None
        }
    }
}

/// Verify the container engine is usable before issuing start triggers:
/// server reachable, version at least 20.10, compose plugin present.
///
/// # Errors
///
/// Returns an error with recovery guidance when any check fails.
pub async fn check_prerequisites(engine: &impl EngineInspector) -> Result<()> {
    let output = engine.server_version().await.map_err(|_| {
        anyhow::anyhow!("Docker engine not available.\n\nInstall Docker and re-run 'termdock up'.")
    })?;
    if !output.status.success() {
        anyhow::bail!(
            "Docker engine is not responding.\n\nStart the Docker daemon and re-run 'termdock up'."
        );
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    if let Some(ver_str) = stdout.lines().next().map(|l| l.trim().trim_start_matches('v'))
        && let Ok(v) = semver::Version::parse(ver_str)
        && v < ENGINE_MIN_VERSION
    {
        anyhow::bail!("Docker engine {v} is too old (need >= {ENGINE_MIN_VERSION}).");
    }

    let compose = engine.compose_version().await;
    match compose {
        Ok(output) if output.status.success() => Ok(()),
        _ => anyhow::bail!(
            "Docker Compose plugin not available.\n\nInstall docker-compose-plugin and re-run 'termdock up'."
        ),
    }
}

/// Stages 3–4: bring every declared service up, then customize the terminal
/// when it is ready. Returns the report plus the customization outcome.
///
/// # Errors
///
/// Returns an error naming the failed stage when a required service never
/// became ready or the terminal customization failed.
pub async fn bring_up_and_customize(
    engine: &impl ContainerEngine,
    net: &impl NetworkProbe,
    reporter: &impl ProgressReporter,
    manifest: &Path,
    descriptors: &[ServiceDescriptor],
    steps: &[CustomizationStep],
) -> Result<(LaunchReport, Option<CustomizationOutcome>)> {
    let report = launcher::launch_all(engine, net, reporter, manifest, descriptors).await;

    let mut customization = None;
    let mut customize_err = None;
    if let Some(desc) = descriptors.iter().find(|d| d.name == TERMINAL_SERVICE)
        && report.is_ready(&desc.name)
    {
        match customizer::customize(engine, net, reporter, &report, desc, steps).await {
            Ok(outcome) => customization = Some(outcome),
            Err(e) => customize_err = Some(e),
        }
    }

    let failed = report.failed_required();
    if !failed.is_empty() {
        let mut lines = Vec::with_capacity(failed.len());
        for outcome in &failed {
            lines.push(format!(
                "  service '{}': {}",
                outcome.name,
                outcome.error.as_deref().unwrap_or("unknown failure")
            ));
        }
        anyhow::bail!("launch failed:\n{}", lines.join("\n"));
    }
    if let Some(e) = customize_err {
        return Err(anyhow::Error::new(e).context("customization failed"));
    }
    Ok((report, customization))
}

/// The whole run: Resolver → Reconciler → Launcher → Customizer.
///
/// # Errors
///
/// Returns an error (and a non-zero process exit) for malformed
/// configuration, missing engine prerequisites, a required service that
/// never became ready, or a failed terminal customization.
#[allow(clippy::too_many_arguments)]
pub async fn provision(
    engine: &impl ContainerEngine,
    runner: &impl CommandRunner,
    fetcher: &impl AssetFetcher,
    fs: &impl LocalFs,
    net: &impl NetworkProbe,
    interaction: &impl Interaction,
    reporter: &impl ProgressReporter,
    opts: &ProvisionOptions,
) -> Result<RunSummary> {
    let started_at = Utc::now();

    let mut config =
        resolve_and_reconcile(fs, fetcher, reporter, &opts.data_dir, &opts.overrides)?;

    if offer_editor_review(runner, interaction, reporter, &env_path(&opts.data_dir)).await? {
        // Re-resolve so manual edits (e.g. the port) drive probes and firewall.
        let existing = read_existing_env(fs, reporter, &opts.data_dir);
        config = resolve(&opts.overrides, existing.as_ref())?;
    }

    firewall::open_ports(
        runner,
        reporter,
        &[API_PORT, config.mt5_port, GRAPHICAL_PORT],
    )
    .await;

    check_prerequisites(engine).await?;

    let manifest = manifest_path(&opts.data_dir);
    let descriptors = service_descriptors(&config);
    let steps = terminal_steps(&opts.data_dir);
    let (report, customization) =
        bring_up_and_customize(engine, net, reporter, &manifest, &descriptors, &steps).await?;

    Ok(RunSummary {
        started_at,
        finished_at: Utc::now(),
        config,
        env_path: env_path(&opts.data_dir),
        report,
        customization,
    })
}

/// Offer to open the generated configuration in the operator's editor.
/// Skipped automatically when input is not interactive. Returns whether the
/// editor ran (the caller re-resolves in that case).
async fn offer_editor_review(
    runner: &impl CommandRunner,
    interaction: &impl Interaction,
    reporter: &impl ProgressReporter,
    env_path: &Path,
) -> Result<bool> {
    if !interaction.is_interactive() {
        return Ok(false);
    }
    let prompt = format!("Review the generated configuration ({})?", env_path.display());
    if !interaction.confirm(&prompt, false)? {
        return Ok(false);
    }
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "nano".to_string());
    let path = env_path.to_string_lossy().into_owned();
    match runner.run_status(&editor, &[&path]).await {
        Ok(status) if status.success() => Ok(true),
        Ok(status) => {
            reporter.warn(&format!("editor exited with {status}; keeping generated values"));
            Ok(false)
        }
        Err(e) => {
            reporter.warn(&format!("could not launch editor '{editor}': {e:#}"));
            Ok(false)
        }
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::application::services::test_support::{err_output, impl_engine_stubs, ok_output};
    use crate::domain::config::resolve;

    fn config() -> ProvisioningConfig {
        resolve(&Overrides::default(), None).expect("defaults resolve")
    }

    #[test]
    fn resource_specs_declare_env_as_overwrite_always() {
        let specs = resource_specs(Path::new("/data"), &config());
        let env = specs
            .iter()
            .find(|s| s.name == "environment file")
            .expect("env spec");
        match &env.kind {
            ResourceKind::Generated { policy, mode, .. } => {
                assert_eq!(*policy, ContentPolicy::OverwriteAlways);
                assert_eq!(*mode, Some(0o600));
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn resource_specs_declare_settings_as_create_if_absent() {
        let specs = resource_specs(Path::new("/data"), &config());
        let settings = specs
            .iter()
            .find(|s| s.name == "terminal settings")
            .expect("settings spec");
        match &settings.kind {
            ResourceKind::Generated { policy, content, .. } => {
                assert_eq!(*policy, ContentPolicy::CreateIfAbsent);
                assert!(content.contains("Port=8002"), "got: {content}");
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn resource_specs_reconcile_directories_before_files() {
        let specs = resource_specs(Path::new("/data"), &config());
        let first_file = specs
            .iter()
            .position(|s| !matches!(s.kind, ResourceKind::Directory))
            .expect("a file spec");
        assert!(
            specs[..first_file]
                .iter()
                .all(|s| matches!(s.kind, ResourceKind::Directory)),
            "directories must come first"
        );
    }

    #[test]
    fn service_descriptors_use_resolved_host_and_port() {
        let mut cfg = config();
        cfg.mt5_host = "trading.example.test".to_string();
        cfg.mt5_port = 9000;
        let descriptors = service_descriptors(&cfg);
        let mt5 = descriptors
            .iter()
            .find(|d| d.name == TERMINAL_SERVICE)
            .expect("mt5 descriptor");
        assert!(mt5.probes.contains(&ReadinessProbe::Tcp {
            host: "trading.example.test".to_string(),
            port: 9000,
        }));
        assert!(mt5.required);
    }

    #[test]
    fn terminal_steps_end_with_restart() {
        let steps = terminal_steps(Path::new("/data"));
        assert_eq!(steps.len(), 3);
        assert!(matches!(steps.last(), Some(CustomizationStep::Restart)));
    }

    struct InspectorStub {
        version: &'static str,
        compose_ok: bool,
    }

    impl EngineInspector for InspectorStub {
        async fn server_version(&self) -> anyhow::Result<std::process::Output> {
            Ok(ok_output(self.version.as_bytes()))
        }
        async fn compose_version(&self) -> anyhow::Result<std::process::Output> {
            if self.compose_ok {
                Ok(ok_output(b"2.29.1\n"))
            } else {
                Ok(err_output(1, b"docker: 'compose' is not a docker command"))
            }
        }
    }

    struct InspectorUnavailable;
    impl EngineInspector for InspectorUnavailable {
        async fn server_version(&self) -> anyhow::Result<std::process::Output> {
            anyhow::bail!("docker: command not found")
        }
        impl_engine_stubs!(compose_version);
    }

    #[tokio::test]
    async fn prerequisites_pass_on_recent_engine() {
        let engine = InspectorStub {
            version: "27.1.1\n",
            compose_ok: true,
        };
        assert!(check_prerequisites(&engine).await.is_ok());
    }

    #[tokio::test]
    async fn prerequisites_reject_old_engine() {
        let engine = InspectorStub {
            version: "19.3.0\n",
            compose_ok: true,
        };
        let err = check_prerequisites(&engine).await.expect_err("expected Err");
        assert!(err.to_string().contains("too old"), "got: {err}");
    }

    #[tokio::test]
    async fn prerequisites_require_compose_plugin() {
        let engine = InspectorStub {
            version: "27.1.1\n",
            compose_ok: false,
        };
        let err = check_prerequisites(&engine).await.expect_err("expected Err");
        assert!(err.to_string().contains("Compose"), "got: {err}");
    }

    #[tokio::test]
    async fn prerequisites_name_missing_engine() {
        let err = check_prerequisites(&InspectorUnavailable)
            .await
            .expect_err("expected Err");
        assert!(err.to_string().contains("Docker engine not available"), "got: {err}");
    }
}
