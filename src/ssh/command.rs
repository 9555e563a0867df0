// ABOUTME: Builds the ssh command line for a local port-forward tunnel.
// ABOUTME: Pure construction; nothing is executed here.

use crate::config::{TunnelConfig, TunnelOptions};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Keep-alive probe interval passed as `ServerAliveInterval`, in seconds.
pub const SERVER_ALIVE_INTERVAL: u32 = 15;

/// A fully built ssh invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

impl SshCommand {
    /// Build the argv for `config`, authenticating with the key at `key_path`.
    pub fn build(config: &TunnelConfig, key_path: &Path, options: &TunnelOptions) -> Self {
        let mut args: Vec<OsString> = vec![
            "-p".into(),
            config.ssh_port.to_string().into(),
            config.destination().into(),
            "-L".into(),
            config.forward_spec().into(),
            "-i".into(),
            key_path.as_os_str().to_owned(),
            // No remote command, stdin from /dev/null, no pty
            "-N".into(),
            "-n".into(),
            "-T".into(),
        ];

        let ssh_options = [
            format!("ServerAliveInterval={}", SERVER_ALIVE_INTERVAL),
            format!("StrictHostKeyChecking={}", options.host_key_checking),
            "BatchMode=yes".to_string(),
            "PreferredAuthentications=publickey".to_string(),
        ];
        for opt in ssh_options {
            args.push("-o".into());
            args.push(opt.into());
        }

        if config.compression {
            args.push("-C".into());
        }

        Self {
            program: options.ssh_program.clone(),
            args,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Whether `arg` appears verbatim in the argument list.
    pub fn contains(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    /// A `std::process::Command` with all three stdio streams piped.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}

impl fmt::Display for SshCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}
