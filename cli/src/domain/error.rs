//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Configuration errors ──────────────────────────────────────────────────────

/// Errors raised while resolving the provisioning configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid port '{value}' for {key}: must be a number between 1 and 65535")]
    InvalidPort { key: String, value: String },
}

// ── Fetch errors ──────────────────────────────────────────────────────────────

/// A remote asset could not be fetched or was unusable.
///
/// Fetch failures are soft by policy: the orchestrator logs them and keeps
/// going with whatever local copy exists.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("fetching {url}: HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("fetching {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("fetched {url} but the body is not valid {format}: {reason}")]
    Malformed {
        url: String,
        format: String,
        reason: String,
    },
}

// ── Launch errors ─────────────────────────────────────────────────────────────

/// A service failed to reach `Ready` within its bounded probe budget.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error(
    "service '{service}' did not become ready after {attempts} probe attempts \
     over {elapsed_secs}s (last probe: {last_probe})"
)]
pub struct LaunchTimeout {
    pub service: String,
    pub attempts: u32,
    pub elapsed_secs: u64,
    pub last_probe: String,
}

// ── Customization errors ──────────────────────────────────────────────────────

/// Errors raised while customizing an already-running service.
#[derive(Debug, Error)]
pub enum CustomizeError {
    #[error("service '{service}' is not ready; no customization steps were run")]
    NotReady { service: String },

    #[error("customization of '{service}' failed at step {index} ({step}): {reason}")]
    StepFailed {
        service: String,
        index: usize,
        step: String,
        reason: String,
    },
}
