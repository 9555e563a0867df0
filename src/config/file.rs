// ABOUTME: YAML tunnel definition files (tunnel.yml) and template scaffolding.
// ABOUTME: Loads, discovers, and resolves a file into params plus options.

use super::{ConfigError, KeySource, TunnelOptions, TunnelParams, deserialize};
use crate::error::{Error, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

pub const CONFIG_FILENAME: &str = "tunnel.yml";
pub const CONFIG_FILENAME_ALT: &str = "tunnel.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".tunnelkeeper/tunnel.yml";

#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TunnelFile {
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
    pub private_key: Option<KeySource>,
    #[serde(default)]
    pub compression: Option<bool>,
    #[serde(default)]
    pub options: TunnelOptions,
}

impl fmt::Debug for TunnelFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = self.private_key.as_ref().map(|source| match source {
            KeySource::Literal(_) => "<inline>".to_string(),
            KeySource::FromEnv { var, .. } => format!("env:{}", var),
            KeySource::FromFile { file } => format!("file:{}", file.display()),
        });
        f.debug_struct("TunnelFile")
            .field("user", &self.user)
            .field("ssh_host", &self.ssh_host)
            .field("ssh_port", &self.ssh_port)
            .field("local_port", &self.local_port)
            .field("remote_host", &self.remote_host)
            .field("remote_port", &self.remote_port)
            .field("private_key", &key)
            .field("compression", &self.compression)
            .field("options", &self.options)
            .finish()
    }
}

impl TunnelFile {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Resolve the key source and split into tunnel params and supervisor options.
    pub fn into_parts(self) -> std::result::Result<(TunnelParams, TunnelOptions), ConfigError> {
        let private_key = self
            .private_key
            .as_ref()
            .map(KeySource::resolve)
            .transpose()?;

        let params = TunnelParams {
            user: self.user,
            ssh_host: self.ssh_host,
            ssh_port: self.ssh_port,
            local_port: self.local_port,
            remote_host: self.remote_host,
            remote_port: self.remote_port,
            private_key,
            compression: self.compression,
        };

        Ok((params, self.options))
    }
}

pub fn init_config(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(Error::AlreadyExists(config_path));
    }

    std::fs::write(&config_path, TEMPLATE)?;

    Ok(())
}

const TEMPLATE: &str = r#"user: deploy
sshHost: bastion.example.com
sshPort: 22
localPort: 33006
remoteHost: db.internal
remotePort: 3306
# Key material: inline string, {env: VAR}, or {file: path}
privateKey:
  env: TUNNEL_PRIVATE_KEY
compression: false

options:
  sshProgram: ssh
  settleDelay: 1s
  # Host key verification is off by default (StrictHostKeyChecking=no).
  # Set to accept-new or yes to verify against ~/.ssh/known_hosts.
  hostKeyChecking: "no"
"#;
