use std::fs;
use std::path::Path;

use anyhow::{bail, Result};

use crate::config::types::ServiceConfig;

/// Load and validate config from YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ServiceConfig> {
    let raw = fs::read_to_string(path)?;
    let mut config: ServiceConfig = serde_yaml::from_str(&raw)?;

    // Apply defaults
    if config.settings.check_interval_secs.is_none() {
        config.settings.check_interval_secs = Some(1800);
    }

    // Validate
    if config.settings.check_interval_secs == Some(0) {
        bail!("settings.check_interval_secs must be greater than zero");
    }
    if config.auth.token_url.trim().is_empty() {
        bail!("auth.token_url must not be empty");
    }
    if config.auth.request_timeout_ms == 0 {
        bail!("auth.request_timeout_ms must be greater than zero");
    }
    if config.store.path.trim().is_empty() {
        bail!("store.path must not be empty");
    }

    Ok(config)
}
