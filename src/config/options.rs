// ABOUTME: Supervisor options that are not part of the tunnel definition.
// ABOUTME: Covers the ssh program, settle delay, and host key policy.

use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Value passed to ssh as `StrictHostKeyChecking=<value>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostKeyChecking {
    /// Accept any host key. Matches the historical default of this tool.
    #[default]
    No,
    AcceptNew,
    Yes,
}

impl HostKeyChecking {
    pub fn as_str(&self) -> &'static str {
        match self {
            HostKeyChecking::No => "no",
            HostKeyChecking::AcceptNew => "accept-new",
            HostKeyChecking::Yes => "yes",
        }
    }
}

impl fmt::Display for HostKeyChecking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TunnelOptions {
    #[serde(default = "default_ssh_program")]
    pub ssh_program: PathBuf,

    /// How long to wait after spawning before deciding whether ssh survived.
    #[serde(default = "default_settle_delay", with = "humantime_serde")]
    pub settle_delay: Duration,

    #[serde(default)]
    pub host_key_checking: HostKeyChecking,
}

fn default_ssh_program() -> PathBuf {
    PathBuf::from("ssh")
}

fn default_settle_delay() -> Duration {
    Duration::from_secs(1)
}

impl Default for TunnelOptions {
    fn default() -> Self {
        TunnelOptions {
            ssh_program: default_ssh_program(),
            settle_delay: default_settle_delay(),
            host_key_checking: HostKeyChecking::default(),
        }
    }
}

impl TunnelOptions {
    pub fn ssh_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.ssh_program = program.into();
        self
    }

    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    pub fn host_key_checking(mut self, policy: HostKeyChecking) -> Self {
        self.host_key_checking = policy;
        self
    }
}
