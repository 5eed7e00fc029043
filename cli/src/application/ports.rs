//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::Path;
use std::process::Output;

use anyhow::Result;

use crate::domain::error::FetchError;

// ── Container Engine Ports ────────────────────────────────────────────────────

/// Compose-level control: start declared services and list their state.
#[allow(async_fn_in_trait)]
pub trait ComposeControl {
    /// Bring one named service up in detached mode (no-op for a service that
    /// is already running).
    async fn compose_up(&self, manifest: &Path, service: &str) -> Result<Output>;
    /// List the manifest's services as one JSON object per line.
    async fn compose_ps(&self, manifest: &Path) -> Result<Output>;
}

/// Operations against a single running container.
#[allow(async_fn_in_trait)]
pub trait ContainerControl {
    /// Restart the container process.
    async fn restart(&self, container: &str) -> Result<Output>;
    /// Execute a command inside the container and capture output.
    async fn exec(&self, container: &str, argv: &[&str]) -> Result<Output>;
    /// Copy a host file into the container's filesystem.
    async fn copy_in(&self, local: &Path, container: &str, dest: &str) -> Result<Output>;
    /// Names of running containers whose name matches `filter`, one per line.
    async fn running_names(&self, filter: &str) -> Result<Output>;
}

/// Engine state inspection: version queries for the prerequisite gate.
#[allow(async_fn_in_trait)]
pub trait EngineInspector {
    /// Engine server version (e.g. `"27.1.1"`).
    async fn server_version(&self) -> Result<Output>;
    /// Compose plugin version.
    async fn compose_version(&self) -> Result<Output>;
}

/// Composite trait — any type implementing all three sub-traits is a
/// `ContainerEngine`.
pub trait ContainerEngine: ComposeControl + ContainerControl + EngineInspector {}

/// Blanket implementation for the composite trait.
impl<T> ContainerEngine for T where T: ComposeControl + ContainerControl + EngineInspector {}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: std::time::Duration,
    ) -> Result<Output>;
    /// Run a program with inherited stdio (interactive, e.g. the editor) and
    /// return only its exit status.
    async fn run_status(&self, program: &str, args: &[&str]) -> Result<std::process::ExitStatus>;
}

// ── Asset Fetch Port ──────────────────────────────────────────────────────────

/// Fetches remote asset bodies (manifest templates, image configuration).
///
/// Synchronous on purpose: reconciliation is a sequential, blocking phase and
/// the assets are small.
pub trait AssetFetcher {
    /// Fetch the full body at `url`.
    ///
    /// # Errors
    ///
    /// Returns a typed [`FetchError`] so callers can apply the soft-failure
    /// policy (keep the stale local copy, continue with a warning).
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

// ── Filesystem Port ───────────────────────────────────────────────────────────

/// Abstracts local filesystem access for the reconciler.
pub trait LocalFs {
    fn exists(&self, path: &Path) -> bool;
    /// Recursively create a directory; succeeds if it already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if creation fails for any other reason.
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    /// Read a file's full contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    fn read(&self, path: &Path) -> Result<Vec<u8>>;
    /// Write atomically (temp file + rename) so interruption never leaves a
    /// partially written file. `mode` restricts Unix permissions when given.
    ///
    /// # Errors
    ///
    /// Returns an error if staging or finalizing the write fails.
    fn write_atomic(&self, path: &Path, content: &[u8], mode: Option<u32>) -> Result<()>;
}

// ── Network Probe Port ────────────────────────────────────────────────────────

/// Abstracts network connectivity checks so readiness polling can be tested
/// without real sockets.
#[allow(async_fn_in_trait)]
pub trait NetworkProbe {
    /// Check TCP connectivity to the given host and port.
    async fn check_tcp(&self, host: &str, port: u16) -> Result<bool>;
}

// ── Interaction Port ──────────────────────────────────────────────────────────

/// Interactivity capability: terminal detection plus yes/no confirmation.
///
/// Injected so automated runs (CI, `--yes`) supply a fixed-answer
/// implementation and never block on a prompt.
pub trait Interaction {
    /// Whether prompting the operator is possible and allowed.
    fn is_interactive(&self) -> bool;
    /// Ask a yes/no question; implementations must only be called when
    /// `is_interactive()` is true.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails (e.g. no TTY available).
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Restart Notification Port ─────────────────────────────────────────────────

/// Notifies the trading-engine API that the terminal container restarted so
/// it can re-establish its bridge connection. Best-effort by policy.
pub trait RestartNotifier {
    /// Send the restart notification.
    ///
    /// # Errors
    ///
    /// Returns an error when the engine API is unreachable or rejects the
    /// notification; callers downgrade this to a warning.
    fn notify_restart(&self, service: &str) -> Result<()>;
}
