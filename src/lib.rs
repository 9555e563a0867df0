// ABOUTME: Library root for tunnelkeeper - supervised ssh port-forward tunnels.
// ABOUTME: The CLI binary is in main.rs.

pub mod config;
pub mod error;
pub mod ssh;
pub mod tunnel;

pub use config::{TunnelConfig, TunnelOptions, TunnelParams};
pub use error::{Error, Result};
pub use ssh::{KeyPair, ProcessStatus};
pub use tunnel::Tunnel;
