// ABOUTME: Public tunnel API: open, status, close, and key pair generation.
// ABOUTME: Wires validation, key files, command building, and the supervisor together.

use crate::config::{TunnelOptions, TunnelParams};
use crate::error::{Error, Result};
use crate::ssh::{KeyFile, KeyGenerator, KeyPair, ProcessStatus, ProcessSupervisor, SshCommand};
use parking_lot::Mutex;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

struct Inner {
    supervisor: ProcessSupervisor,
    local_port: Option<u16>,
}

/// A local port-forward through a bastion host, backed by one ssh process.
///
/// All methods take `&self`; handle transitions are serialized internally.
/// Dropping the tunnel terminates the process.
pub struct Tunnel {
    options: TunnelOptions,
    inner: Mutex<Inner>,
}

impl Default for Tunnel {
    fn default() -> Self {
        Self::new(TunnelOptions::default())
    }
}

impl Tunnel {
    /// Create a closed tunnel.
    pub fn new(options: TunnelOptions) -> Self {
        let supervisor = ProcessSupervisor::new(options.settle_delay);
        Self {
            options,
            inner: Mutex::new(Inner {
                supervisor,
                local_port: None,
            }),
        }
    }

    /// Create a tunnel and open it right away.
    pub fn with_config(params: TunnelParams, options: TunnelOptions) -> Result<Self> {
        let tunnel = Self::new(options);
        tunnel.open(params)?;
        Ok(tunnel)
    }

    pub fn options(&self) -> &TunnelOptions {
        &self.options
    }

    /// Validate `params`, start ssh, and wait for it to settle.
    ///
    /// The key file only exists for the duration of the spawn attempt. On
    /// any failure the tunnel is left closed.
    pub fn open(&self, params: TunnelParams) -> Result<ProcessStatus> {
        let mut inner = self.inner.lock();

        if let Some(status) = inner.supervisor.status() {
            if status.running {
                return Err(Error::AlreadyRunning { pid: status.pid });
            }
        }

        let config = params.validate()?;
        let key_file = KeyFile::write(&config.private_key)?;
        let command = SshCommand::build(&config, key_file.path(), &self.options);

        let result = inner.supervisor.spawn(&command);
        key_file.remove();
        let status = result?;

        inner.local_port = Some(config.local_port);
        tracing::info!(
            pid = status.pid,
            destination = %config.destination(),
            forward = %config.forward_spec(),
            "SSH tunnel established"
        );

        Ok(status)
    }

    /// Freshly computed process status, `None` when closed.
    pub fn status(&self) -> Option<ProcessStatus> {
        self.inner.lock().supervisor.status()
    }

    pub fn is_open(&self) -> bool {
        self.status().is_some_and(|s| s.running)
    }

    /// Local end of the forward while the ssh process is alive.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        let mut inner = self.inner.lock();
        let running = inner.supervisor.status().is_some_and(|s| s.running);
        inner
            .local_port
            .filter(|_| running)
            .map(|port| SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port)))
    }

    /// Terminate the ssh process. Safe to call any number of times.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.supervisor.terminate();
        inner.local_port = None;
    }

    /// Generate an RSA key pair with the system `ssh-keygen`.
    pub fn generate_key_pair() -> Result<KeyPair> {
        KeyGenerator::default().generate()
    }
}

impl std::fmt::Debug for Tunnel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tunnel")
            .field("options", &self.options)
            .field("local_port", &self.inner.lock().local_port)
            .finish()
    }
}
