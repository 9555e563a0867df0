// ABOUTME: Tunnel configuration types, defaults, and validation.
// ABOUTME: Turns a loose field mapping into a normalized TunnelConfig.

mod deserialize;
mod file;
mod key_source;
mod options;

pub use file::{
    CONFIG_FILENAME, CONFIG_FILENAME_ALT, CONFIG_FILENAME_DIR, TunnelFile, init_config,
};
pub use key_source::KeySource;
pub use options::{HostKeyChecking, TunnelOptions};

use serde::Deserialize;
use std::fmt;
use thiserror::Error;

pub const DEFAULT_SSH_PORT: u16 = 22;
pub const DEFAULT_LOCAL_PORT: u16 = 33006;

/// Required fields in the order they are reported when missing.
pub const REQUIRED_FIELDS: [&str; 7] = [
    "user",
    "sshHost",
    "sshPort",
    "localPort",
    "remoteHost",
    "remotePort",
    "privateKey",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing parameters '{}'", .0.join(","))]
    MissingFields(Vec<&'static str>),

    #[error("invalid port for {field}: {value}")]
    InvalidPort { field: &'static str, value: String },

    #[error("key must not be empty")]
    EmptyKeyMaterial,

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("failed to read key from {path}: {reason}")]
    KeyUnreadable { path: String, reason: String },
}

/// Raw tunnel parameters, every field optional.
///
/// This is the field -> value mapping callers hand to [`crate::Tunnel::open`].
/// Field names follow the camelCase keys used in `tunnel.yml`.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TunnelParams {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub ssh_host: Option<String>,
    #[serde(default, deserialize_with = "deserialize::port")]
    pub ssh_port: Option<u16>,
    #[serde(default, deserialize_with = "deserialize::port")]
    pub local_port: Option<u16>,
    #[serde(default)]
    pub remote_host: Option<String>,
    #[serde(default, deserialize_with = "deserialize::port")]
    pub remote_port: Option<u16>,
    #[serde(default)]
    pub private_key: Option<String>,
    #[serde(default)]
    pub compression: Option<bool>,
}

impl TunnelParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn ssh_host(mut self, host: impl Into<String>) -> Self {
        self.ssh_host = Some(host.into());
        self
    }

    pub fn ssh_port(mut self, port: u16) -> Self {
        self.ssh_port = Some(port);
        self
    }

    pub fn local_port(mut self, port: u16) -> Self {
        self.local_port = Some(port);
        self
    }

    pub fn remote_host(mut self, host: impl Into<String>) -> Self {
        self.remote_host = Some(host.into());
        self
    }

    pub fn remote_port(mut self, port: u16) -> Self {
        self.remote_port = Some(port);
        self
    }

    pub fn private_key(mut self, key: impl Into<String>) -> Self {
        self.private_key = Some(key.into());
        self
    }

    pub fn compression(mut self, enabled: bool) -> Self {
        self.compression = Some(enabled);
        self
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Apply defaults and check that every required field is present.
    pub fn validate(&self) -> Result<TunnelConfig, ConfigError> {
        let user = non_empty(&self.user);
        let ssh_host = non_empty(&self.ssh_host);
        let ssh_port = self.ssh_port.unwrap_or(DEFAULT_SSH_PORT);
        let local_port = self.local_port.unwrap_or(DEFAULT_LOCAL_PORT);
        let remote_host = non_empty(&self.remote_host);
        let remote_port = self.remote_port;
        let private_key = non_empty(&self.private_key);

        let present = [
            user.is_some(),
            ssh_host.is_some(),
            true,
            true,
            remote_host.is_some(),
            remote_port.is_some(),
            private_key.is_some(),
        ];
        let missing: Vec<&'static str> = REQUIRED_FIELDS
            .iter()
            .zip(present)
            .filter(|(_, present)| !present)
            .map(|(field, _)| *field)
            .collect();

        let (Some(user), Some(ssh_host), Some(remote_host), Some(remote_port), Some(private_key)) =
            (user, ssh_host, remote_host, remote_port, private_key)
        else {
            return Err(ConfigError::MissingFields(missing));
        };

        for (field, port) in [
            ("sshPort", ssh_port),
            ("localPort", local_port),
            ("remotePort", remote_port),
        ] {
            if port == 0 {
                return Err(ConfigError::InvalidPort {
                    field,
                    value: port.to_string(),
                });
            }
        }

        Ok(TunnelConfig {
            user: user.to_string(),
            ssh_host: ssh_host.to_string(),
            ssh_port,
            local_port,
            remote_host: remote_host.to_string(),
            remote_port,
            private_key: private_key.to_string(),
            compression: self.compression.unwrap_or(false),
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Validated tunnel configuration with defaults applied.
#[derive(Clone, PartialEq, Eq)]
pub struct TunnelConfig {
    pub user: String,
    pub ssh_host: String,
    pub ssh_port: u16,
    pub local_port: u16,
    pub remote_host: String,
    pub remote_port: u16,
    pub private_key: String,
    pub compression: bool,
}

impl TunnelConfig {
    /// The `user@host` destination passed to ssh.
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.ssh_host)
    }

    /// The `-L` spec: `localPort:remoteHost:remotePort`.
    pub fn forward_spec(&self) -> String {
        format!(
            "{}:{}:{}",
            self.local_port, self.remote_host, self.remote_port
        )
    }
}

// Key material never shows up in logs.
impl fmt::Debug for TunnelParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TunnelParams")
            .field("user", &self.user)
            .field("ssh_host", &self.ssh_host)
            .field("ssh_port", &self.ssh_port)
            .field("local_port", &self.local_port)
            .field("remote_host", &self.remote_host)
            .field("remote_port", &self.remote_port)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("compression", &self.compression)
            .finish()
    }
}

impl fmt::Debug for TunnelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TunnelConfig")
            .field("user", &self.user)
            .field("ssh_host", &self.ssh_host)
            .field("ssh_port", &self.ssh_port)
            .field("local_port", &self.local_port)
            .field("remote_host", &self.remote_host)
            .field("remote_port", &self.remote_port)
            .field("private_key", &"<redacted>")
            .field("compression", &self.compression)
            .finish()
    }
}
