//! Service descriptors and the launch state machine types.

use std::time::Duration;

/// Bounded fixed-interval retry policy for readiness probing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl RetryPolicy {
    /// Total time budget the policy allows before a service is `Failed`.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

/// How to observe that a service finished starting.
///
/// A descriptor may carry several probes; all must pass within a single
/// attempt for the service to count as ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessProbe {
    /// TCP connect against a host/port (the terminal's remote-control port).
    Tcp { host: String, port: u16 },
    /// A container with a matching name is listed as running by the engine.
    Container { name: String },
}

impl std::fmt::Display for ReadinessProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tcp { host, port } => write!(f, "tcp {host}:{port}"),
            Self::Container { name } => write!(f, "container '{name}' running"),
        }
    }
}

/// A named logical service: start trigger, readiness probes, retry budget.
///
/// Declared statically per run and discarded afterwards; the long-running
/// process it describes outlives the orchestrator.
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    pub name: String,
    /// Service name in the compose manifest (start trigger target).
    pub compose_service: String,
    /// Container name the engine reports for this service.
    pub container: String,
    pub probes: Vec<ReadinessProbe>,
    pub retry: RetryPolicy,
    /// Required services make the whole run exit non-zero when they fail.
    pub required: bool,
}

// ── Launch state machine ─────────────────────────────────────────────────────

/// Per-service launch state: `NotStarted → Starting → (Ready | Failed)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    NotStarted,
    Starting,
    Ready,
    Failed,
}

/// Terminal record for one service in a [`LaunchReport`].
#[derive(Debug, Clone)]
pub struct ServiceOutcome {
    pub name: String,
    pub state: ServiceState,
    /// Probe attempts consumed (0 when the start trigger itself failed).
    pub attempts: u32,
    pub required: bool,
    /// Failure detail for `Failed` services: the trigger error or the last
    /// probe error.
    pub error: Option<String>,
}

/// Result of a full bring-up pass over the declared services.
#[derive(Debug, Clone, Default)]
pub struct LaunchReport {
    pub services: Vec<ServiceOutcome>,
}

impl LaunchReport {
    #[must_use]
    pub fn is_ready(&self, name: &str) -> bool {
        self.services
            .iter()
            .any(|s| s.name == name && s.state == ServiceState::Ready)
    }

    /// Required services that ended in `Failed`.
    #[must_use]
    pub fn failed_required(&self) -> Vec<&ServiceOutcome> {
        self.services
            .iter()
            .filter(|s| s.required && s.state == ServiceState::Failed)
            .collect()
    }
}
