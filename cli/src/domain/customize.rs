//! Post-launch customization step types.

use std::path::PathBuf;

/// An ordered action applied to an already-running service.
///
/// Steps execute in declared order; the first failure aborts the rest.
#[derive(Debug, Clone)]
pub enum CustomizationStep {
    /// Copy a host artifact into the service's filesystem.
    CopyIn { local: PathBuf, dest: String },
    /// Execute a command inside the service.
    Exec { argv: Vec<String> },
    /// Restart the service process; must be re-verified ready afterwards.
    Restart,
}

impl CustomizationStep {
    /// Short description used in progress and error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::CopyIn { local, dest } => {
                format!("copy {} -> {dest}", local.display())
            }
            Self::Exec { argv } => format!("exec {}", argv.join(" ")),
            Self::Restart => "restart".to_string(),
        }
    }
}

/// Successful customization summary for one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomizationOutcome {
    pub service: String,
    pub steps_run: usize,
    /// Whether a restart step ran (and readiness was re-verified).
    pub restarted: bool,
}
