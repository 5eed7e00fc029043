//! Infrastructure adapter that routes all docker CLI calls through a
//! `CommandRunner`.
//!
//! Generic over `R: CommandRunner` so that tests can inject a mock runner
//! without spawning real processes.
//!
//! Two runners are held:
//! - `cmd_runner`: used for docker subcommands (ps, restart, version, ...)
//! - `compose_runner`: used for `docker compose` commands (may pull images
//!   on first run, so it carries a much longer timeout)

use std::path::Path;
use std::process::Output;

use anyhow::{Context, Result};

use crate::application::ports::{
    CommandRunner, ComposeControl, ContainerControl, EngineInspector,
};
use crate::infra::command_runner::{
    DEFAULT_CMD_TIMEOUT, DEFAULT_COMPOSE_TIMEOUT, TokioCommandRunner,
};

pub struct DockerEngine<R: CommandRunner> {
    cmd_runner: R,
    compose_runner: R,
}

impl<R: CommandRunner> DockerEngine<R> {
    /// Create a new engine adapter with explicit runner instances.
    pub fn new(cmd_runner: R, compose_runner: R) -> Self {
        Self {
            cmd_runner,
            compose_runner,
        }
    }
}

impl DockerEngine<TokioCommandRunner> {
    /// Convenience constructor for production use.
    /// Creates a `DockerEngine` backed by `TokioCommandRunner` with default
    /// timeouts.
    #[must_use]
    pub fn default_runner() -> Self {
        Self {
            cmd_runner: TokioCommandRunner::new(DEFAULT_CMD_TIMEOUT),
            compose_runner: TokioCommandRunner::new(DEFAULT_COMPOSE_TIMEOUT),
        }
    }
}

impl<R: CommandRunner> ComposeControl for DockerEngine<R> {
    async fn compose_up(&self, manifest: &Path, service: &str) -> Result<Output> {
        let manifest = manifest.to_string_lossy();
        self.compose_runner
            .run("docker", &["compose", "-f", &manifest, "up", "-d", service])
            .await
            .context("failed to run docker compose up")
    }

    async fn compose_ps(&self, manifest: &Path) -> Result<Output> {
        let manifest = manifest.to_string_lossy();
        self.cmd_runner
            .run("docker", &["compose", "-f", &manifest, "ps", "--format", "json"])
            .await
            .context("failed to run docker compose ps")
    }
}

impl<R: CommandRunner> ContainerControl for DockerEngine<R> {
    async fn restart(&self, container: &str) -> Result<Output> {
        self.cmd_runner
            .run("docker", &["restart", container])
            .await
            .context("failed to run docker restart")
    }

    async fn exec(&self, container: &str, argv: &[&str]) -> Result<Output> {
        let mut args = vec!["exec", container];
        args.extend_from_slice(argv);
        self.compose_runner
            .run("docker", &args)
            .await
            .context("failed to run docker exec")
    }

    async fn copy_in(&self, local: &Path, container: &str, dest: &str) -> Result<Output> {
        let local = local.to_string_lossy();
        let target = format!("{container}:{dest}");
        self.cmd_runner
            .run("docker", &["cp", &local, &target])
            .await
            .context("failed to run docker cp")
    }

    async fn running_names(&self, filter: &str) -> Result<Output> {
        let name_filter = format!("name={filter}");
        self.cmd_runner
            .run(
                "docker",
                &["ps", "--filter", &name_filter, "--format", "{{.Names}}"],
            )
            .await
            .context("failed to run docker ps")
    }
}

impl<R: CommandRunner> EngineInspector for DockerEngine<R> {
    async fn server_version(&self) -> Result<Output> {
        self.cmd_runner
            .run("docker", &["version", "--format", "{{.Server.Version}}"])
            .await
            .context("failed to run docker version")
    }

    async fn compose_version(&self) -> Result<Output> {
        self.cmd_runner
            .run("docker", &["compose", "version", "--short"])
            .await
            .context("failed to run docker compose version")
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
