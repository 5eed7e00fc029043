//! Domain layer — pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod customize;
pub mod error;
pub mod resource;
pub mod service;

#[allow(unused_imports)]
pub use config::{CONFIG_KEYS, Overrides, ProvisioningConfig, parse_env_file, resolve};
#[allow(unused_imports)]
pub use customize::{CustomizationOutcome, CustomizationStep};
#[allow(unused_imports)]
pub use error::{ConfigError, CustomizeError, FetchError, LaunchTimeout};
#[allow(unused_imports)]
pub use resource::{ContentPolicy, FetchedFormat, ReconcileResult, ResourceKind, ResourceSpec};
#[allow(unused_imports)]
pub use service::{
    LaunchReport, ReadinessProbe, RetryPolicy, ServiceDescriptor, ServiceOutcome, ServiceState,
};
