//! Interactive `ssh` sessions.

use std::process::Command;

use tracing::{info, warn};

use crate::browser::SshTarget;

/// `ssh` reserves this exit code for its own failures.
const SSH_CONNECTION_FAILED: i32 = 255;

/// Run `ssh user@host` in the foreground. The terminal must not be in raw
/// mode. Whatever the remote shell exits with counts as success; only a
/// spawn failure or ssh's own error code is an error.
pub fn run(target: &SshTarget) -> Result<(), String> {
    let destination = target.destination();
    info!(%destination, "Starting ssh session");
    let status = Command::new("ssh")
        .arg(&destination)
        .status()
        .map_err(|e| format!("failed to start ssh: {e}"))?;
    classify(&destination, status.code())
}

fn classify(destination: &str, code: Option<i32>) -> Result<(), String> {
    match code {
        Some(SSH_CONNECTION_FAILED) => {
            warn!(destination, "ssh could not connect");
            Err(format!("ssh to {destination} failed to connect"))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_exit_codes_are_success() {
        assert!(classify("ubuntu@10.0.0.1", Some(0)).is_ok());
        assert!(classify("ubuntu@10.0.0.1", Some(1)).is_ok());
        assert!(classify("ubuntu@10.0.0.1", Some(130)).is_ok());
        assert!(classify("ubuntu@10.0.0.1", None).is_ok());
    }

    #[test]
    fn test_connection_failure_is_error() {
        let err = classify("ubuntu@10.0.0.1", Some(255)).unwrap_err();
        assert!(err.contains("ubuntu@10.0.0.1"));
    }
}
