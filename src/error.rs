// ABOUTME: Application-wide error types for tunnelkeeper.
// ABOUTME: Uses thiserror for ergonomic error handling.

use crate::config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid tunnel configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("tunnel already established (pid {pid})")]
    AlreadyRunning { pid: u32 },

    #[error("couldn't open SSH tunnel{}", establishment_details(.stdout, .stderr))]
    TunnelEstablishment {
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("tunnel process {pid} is no longer running")]
    TunnelLost { pid: u32, exit_code: Option<i32> },

    #[error("failed to write key file: {0}")]
    KeyFile(#[source] std::io::Error),

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("configuration file not found in {0}")]
    ConfigNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// True for every failure caused by bad or incomplete configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

fn establishment_details(stdout: &str, stderr: &str) -> String {
    let mut details = String::new();
    if !stdout.is_empty() {
        details.push_str(": ");
        details.push_str(stdout);
    }
    if !stderr.is_empty() {
        details.push_str(" Error: ");
        details.push_str(stderr);
    }
    details
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn establishment_message_includes_captured_output() {
        let err = Error::TunnelEstablishment {
            exit_code: Some(255),
            stdout: "banner".to_string(),
            stderr: "Permission denied (publickey).".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "couldn't open SSH tunnel: banner Error: Permission denied (publickey)."
        );
    }

    #[test]
    fn establishment_message_without_output() {
        let err = Error::TunnelEstablishment {
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert_eq!(err.to_string(), "couldn't open SSH tunnel");
    }
}
