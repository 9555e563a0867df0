// ABOUTME: Key pair generation through the system ssh-keygen binary.
// ABOUTME: Keys are produced in a private temp dir, read into memory, then deleted.

use crate::error::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

const KEY_FILE_NAME: &str = "ssh.key";

/// A freshly generated key pair, OpenSSH encoded.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub private: String,
    pub public: String,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("private", &"<redacted>")
            .field("public", &self.public)
            .finish()
    }
}

/// Runs `ssh-keygen -b <bits> -t <type> -f <file> -N "" -q`.
#[derive(Debug, Clone)]
pub struct KeyGenerator {
    program: PathBuf,
    key_type: String,
    bits: u32,
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ssh-keygen"),
            key_type: "rsa".to_string(),
            bits: 2048,
        }
    }
}

impl KeyGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn key_type(mut self, key_type: impl Into<String>) -> Self {
        self.key_type = key_type.into();
        self
    }

    pub fn bits(mut self, bits: u32) -> Self {
        self.bits = bits;
        self
    }

    pub fn generate(&self) -> Result<KeyPair> {
        let dir = tempfile::Builder::new()
            .prefix("tunnelkeeper-keygen-")
            .tempdir()
            .map_err(|e| Error::KeyGeneration(format!("failed to create temp dir: {}", e)))?;
        let key_path = dir.path().join(KEY_FILE_NAME);
        let pub_path = dir.path().join(format!("{}.pub", KEY_FILE_NAME));

        let result = self.run(&key_path, &pub_path);

        for path in [&key_path, &pub_path] {
            if let Err(e) = std::fs::remove_file(path) {
                tracing::debug!(path = %path.display(), "failed to remove generated key: {}", e);
            }
        }
        if let Err(e) = dir.close() {
            tracing::debug!("failed to remove keygen temp dir: {}", e);
        }

        result
    }

    fn run(&self, key_path: &Path, pub_path: &Path) -> Result<KeyPair> {
        let program = self.program.display().to_string();

        let output = Command::new(&self.program)
            .arg("-b")
            .arg(self.bits.to_string())
            .arg("-t")
            .arg(&self.key_type)
            .arg("-f")
            .arg(key_path)
            .args(["-N", "", "-q"])
            .stdin(Stdio::null())
            .output()
            .map_err(|source| Error::Spawn {
                program: program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::KeyGeneration(format!(
                "{} exited with {}: {}",
                program,
                output.status,
                stderr.trim()
            )));
        }

        let private = read_key(key_path)?;
        let public = read_key(pub_path)?;

        tracing::debug!(key_type = %self.key_type, bits = self.bits, "generated key pair");

        Ok(KeyPair { private, public })
    }
}

fn read_key(path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::KeyGeneration(format!("failed to read {}: {}", path.display(), e))
    })?;
    if content.trim().is_empty() {
        return Err(Error::KeyGeneration(format!(
            "{} is empty",
            path.display()
        )));
    }
    Ok(content)
}
