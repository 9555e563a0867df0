// ABOUTME: Private key sources for config files.
// ABOUTME: Key material can be inline, read from an env var, or read from a file.

use super::ConfigError;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum KeySource {
    Literal(String),
    FromEnv {
        #[serde(rename = "env")]
        var: String,
        #[serde(default)]
        default: Option<String>,
    },
    FromFile {
        file: PathBuf,
    },
}

impl KeySource {
    /// Resolve to raw key material.
    pub fn resolve(&self) -> Result<String, ConfigError> {
        match self {
            KeySource::Literal(s) => Ok(s.clone()),
            KeySource::FromEnv { var, default } => match std::env::var(var) {
                Ok(val) => Ok(val),
                Err(_) => default
                    .clone()
                    .ok_or_else(|| ConfigError::MissingEnvVar(var.clone())),
            },
            KeySource::FromFile { file } => {
                std::fs::read_to_string(file).map_err(|e| ConfigError::KeyUnreadable {
                    path: file.display().to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }
}
