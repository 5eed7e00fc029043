//! Command handlers — thin wrappers that wire `AppContext` infrastructure
//! into the application services and print results.

pub mod health;
pub mod monitor;
pub mod restart;
pub mod status;
pub mod up;
pub mod version;

use anyhow::Result;

use crate::app::AppContext;
use crate::application::ports::LocalFs;
use crate::application::services::provision::{TERMINAL_SERVICE, env_path, service_descriptors};
use crate::domain::config::{Overrides, ProvisioningConfig, parse_env_file, resolve};
use crate::domain::service::ServiceDescriptor;
use crate::infra::fs::StdFs;

/// Load the persisted configuration (falling back to defaults for anything
/// missing) so post-provisioning commands agree with the last `up` run.
pub fn load_config(app: &AppContext) -> Result<ProvisioningConfig> {
    let path = env_path(&app.data_dir);
    let existing = if StdFs.exists(&path) {
        let bytes = StdFs.read(&path)?;
        Some(parse_env_file(&String::from_utf8_lossy(&bytes)))
    } else {
        None
    };
    Ok(resolve(&Overrides::default(), existing.as_ref())?)
}

/// The terminal service descriptor for the resolved configuration.
pub fn terminal_descriptor(config: &ProvisioningConfig) -> Result<ServiceDescriptor> {
    service_descriptors(config)
        .into_iter()
        .find(|d| d.name == TERMINAL_SERVICE)
        .ok_or_else(|| anyhow::anyhow!("no '{TERMINAL_SERVICE}' service declared"))
}
