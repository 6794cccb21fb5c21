pub mod actions;
pub mod credentials;
mod defaults;
pub mod key;
pub mod keybindings;
pub mod loader;
pub mod resolver;
pub mod store;

use std::time::Duration;

pub use actions::*;
use keybindings::KeybindingsConfig;
pub use loader::load;
pub use resolver::KeyResolver;
use serde::{Deserialize, Serialize};
pub use store::{ConfigStore, MemoryStore, TomlConfigStore};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    pub name: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            name: "Catppuccin Mocha".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// `ovh-eu`, `ovh-ca`, `ovh-us` or a full base URL.
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: "ovh-eu".to_string(),
            access_token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub debug_capacity: usize,
    pub refresh_interval_secs: u64,
    pub notification_secs: u64,
    pub ssh_user: String,
    pub ip_poll_interval_secs: u64,
    pub ip_poll_attempts: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            debug_capacity: crate::debug::DEFAULT_CAPACITY,
            refresh_interval_secs: 10,
            notification_secs: 4,
            ssh_user: "ubuntu".to_string(),
            ip_poll_interval_secs: 5,
            ip_poll_attempts: 60,
        }
    }
}

impl BrowserConfig {
    pub const fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub const fn notification_ttl(&self) -> Duration {
        Duration::from_secs(self.notification_secs)
    }

    pub const fn ip_poll_interval(&self) -> Duration {
        Duration::from_secs(self.ip_poll_interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub theme: ThemeConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub keybindings: KeybindingsConfig,
}
