use std::env;
use std::fs;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::config::credentials;

const CONFIG_DIR: &str = "cloudnav";
const CONFIG_FILE: &str = "config.toml";
const TOKEN_ENV: &str = "OVH_ACCESS_TOKEN";

pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(CONFIG_DIR))
}

pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join(CONFIG_FILE))
}

/// Load the config file, then fill the API credentials from `~/.ovh.conf`
/// and the environment.
pub fn load() -> color_eyre::Result<AppConfig> {
    let mut config = read_file()?;

    let token_missing = config
        .api
        .access_token
        .as_deref()
        .is_none_or(str::is_empty);
    if token_missing {
        if let Some(creds) = credentials::discover() {
            credentials::apply(&mut config.api, &creds);
        }
    }

    if let Ok(token) = env::var(TOKEN_ENV) {
        if !token.is_empty() {
            debug!("Using access token from {TOKEN_ENV}");
            config.api.access_token = Some(token);
        }
    }

    Ok(config)
}

fn read_file() -> color_eyre::Result<AppConfig> {
    let Some(path) = config_path() else {
        warn!("No config directory found, using defaults");
        return Ok(AppConfig::default());
    };

    if !path.exists() {
        debug!(path = %path.display(), "Config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    let content = fs::read_to_string(&path)?;
    let config: AppConfig = toml::from_str(&content)?;
    debug!(path = %path.display(), "Loaded config");
    Ok(config)
}
