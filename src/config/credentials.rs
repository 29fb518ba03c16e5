//! Application credentials from the environment.
//!
//! `.env` is loaded when present. Values are echoed masked at startup so
//! the log never carries a full secret.

use anyhow::{bail, Result};
use tracing::{info, warn};

pub const ENV_APP_KEY: &str = "KIS_APP_KEY";
pub const ENV_APP_SECRET: &str = "KIS_APP_SECRET";
pub const ENV_ACCOUNT: &str = "ACCOUNT";

#[derive(Debug, Clone)]
pub struct Credentials {
    pub app_key: String,
    pub app_secret: String,
    pub account: String,
}

impl Credentials {
    pub fn from_env() -> Result<Self> {
        if dotenvy::dotenv().is_err() {
            warn!(".env file not found, relying on process environment");
        }

        let app_key = required(ENV_APP_KEY)?;
        let app_secret = required(ENV_APP_SECRET)?;
        let account = required(ENV_ACCOUNT)?;

        info!("{ENV_APP_KEY}: {}", mask_secret(&app_key));
        info!("{ENV_APP_SECRET}: {}", mask_secret(&app_secret));
        info!("{ENV_ACCOUNT}: {account}");

        Ok(Self { app_key, app_secret, account })
    }
}

fn required(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => bail!("environment variable {name} is not set"),
    }
}

/// First four characters, the rest replaced with asterisks.
pub fn mask_secret(value: &str) -> String {
    let prefix: String = value.chars().take(4).collect();
    let hidden = value.chars().count().saturating_sub(4);
    format!("{prefix}{}", "*".repeat(hidden))
}
