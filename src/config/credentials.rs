use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::{debug, error};

use crate::config::ApiConfig;

/// The parts of `~/.ovh.conf` the browser understands.
///
/// ```ini
/// [default]
/// endpoint=ovh-eu
///
/// [ovh-eu]
/// access_token=...
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct OvhConf {
    #[serde(default)]
    pub default: DefaultSection,
    #[serde(flatten)]
    pub endpoints: HashMap<String, EndpointSection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DefaultSection {
    pub endpoint: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EndpointSection {
    pub access_token: Option<String>,
}

fn conf_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".ovh.conf"))
}

/// Read `~/.ovh.conf` if present; parse failures are logged and ignored.
pub fn discover() -> Option<OvhConf> {
    let path = conf_path()?;
    if !path.exists() {
        return None;
    }

    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(err) => {
            error!(path = %path.display(), %err, "Failed to read credentials file");
            return None;
        }
    };

    match serini::from_str::<OvhConf>(&content) {
        Ok(conf) => {
            debug!(path = %path.display(), "Loaded credentials file");
            Some(conf)
        }
        Err(err) => {
            error!(path = %path.display(), %err, "Failed to parse credentials file");
            None
        }
    }
}

/// Take the endpoint from `[default]` and the token from that endpoint's
/// section.
pub fn apply(api: &mut ApiConfig, conf: &OvhConf) {
    if let Some(endpoint) = &conf.default.endpoint {
        api.endpoint.clone_from(endpoint);
    }

    let token = conf
        .endpoints
        .get(&api.endpoint)
        .and_then(|section| section.access_token.clone())
        .filter(|token| !token.is_empty());
    if token.is_some() {
        api.access_token = token;
    }
}
