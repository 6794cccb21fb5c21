use clap::Parser;

use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(
    name = "cloudnav",
    version,
    about = "Terminal browser for OVHcloud Public Cloud projects"
)]
pub struct Args {
    /// Project id to open, instead of the saved default
    #[arg(short, long)]
    pub project: Option<String>,

    /// API endpoint: ovh-eu, ovh-ca, ovh-us or a base URL
    #[arg(short, long)]
    pub endpoint: Option<String>,

    /// Number of requests kept in the debug view
    #[arg(long, value_name = "N")]
    pub debug_capacity: Option<usize>,

    /// Seconds between instance list refreshes (0 disables)
    #[arg(long, value_name = "SECS")]
    pub refresh_interval: Option<u64>,
}

impl Args {
    /// Command-line flags win over the config file.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(endpoint) = &self.endpoint {
            config.api.endpoint.clone_from(endpoint);
        }
        if let Some(capacity) = self.debug_capacity {
            config.browser.debug_capacity = capacity;
        }
        if let Some(secs) = self.refresh_interval {
            config.browser.refresh_interval_secs = secs;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let args = Args::try_parse_from([
            "cloudnav",
            "--endpoint",
            "ovh-ca",
            "--refresh-interval",
            "0",
            "-p",
            "abc",
        ])
        .unwrap();
        let mut config = AppConfig::default();
        args.apply(&mut config);

        assert_eq!(config.api.endpoint, "ovh-ca");
        assert_eq!(config.browser.refresh_interval_secs, 0);
        assert_eq!(config.browser.debug_capacity, 100);
        assert_eq!(args.project.as_deref(), Some("abc"));
    }

    #[test]
    fn test_no_flags_keep_config() {
        let args = Args::try_parse_from(["cloudnav"]).unwrap();
        let mut config = AppConfig::default();
        config.api.endpoint = "http://localhost:8080".into();
        args.apply(&mut config);
        assert_eq!(config.api.endpoint, "http://localhost:8080");
    }
}
