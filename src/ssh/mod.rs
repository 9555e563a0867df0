// ABOUTME: Everything that touches the external ssh and ssh-keygen binaries.
// ABOUTME: Command construction, key files, key generation, and process supervision.

mod command;
mod key_file;
mod keygen;
mod supervisor;

pub use command::{SERVER_ALIVE_INTERVAL, SshCommand};
pub use key_file::KeyFile;
pub use keygen::{KeyGenerator, KeyPair};
pub use supervisor::{Lifecycle, ProcessStatus, ProcessSupervisor};
