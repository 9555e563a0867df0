// ABOUTME: Ephemeral on-disk copy of the private key handed to ssh via -i.
// ABOUTME: Owner-only permissions; removal is best-effort and never fails.

use crate::config::ConfigError;
use crate::error::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempPath;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

const KEY_FILE_PREFIX: &str = "ssh-key-";

/// A private key written to a uniquely named temp file.
///
/// The file is deleted by [`KeyFile::remove`] or on drop, whichever comes
/// first. Deletion failures are logged and swallowed.
pub struct KeyFile {
    temp_path: Option<TempPath>,
    path: PathBuf,
}

impl KeyFile {
    /// Write `material` into the system temp directory.
    pub fn write(material: &str) -> Result<Self> {
        Self::write_in(material, &std::env::temp_dir())
    }

    /// Write `material` into `dir`.
    pub fn write_in(material: &str, dir: &Path) -> Result<Self> {
        if material.is_empty() {
            return Err(ConfigError::EmptyKeyMaterial.into());
        }

        let mut file = tempfile::Builder::new()
            .prefix(KEY_FILE_PREFIX)
            .tempfile_in(dir)
            .map_err(Error::KeyFile)?;

        file.write_all(material.as_bytes()).map_err(Error::KeyFile)?;
        file.flush().map_err(Error::KeyFile)?;

        #[cfg(unix)]
        {
            let perms = std::fs::Permissions::from_mode(0o600);
            file.as_file()
                .set_permissions(perms)
                .map_err(Error::KeyFile)?;
        }

        let temp_path = file.into_temp_path();
        // On failure the TempPath drop still removes the file.
        let path = std::fs::canonicalize(&temp_path).map_err(Error::KeyFile)?;

        tracing::debug!(path = %path.display(), "wrote key file");

        Ok(Self {
            temp_path: Some(temp_path),
            path,
        })
    }

    /// Canonical absolute path of the key file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now.
    pub fn remove(mut self) {
        self.remove_inner();
    }

    fn remove_inner(&mut self) {
        if let Some(temp_path) = self.temp_path.take() {
            if let Err(e) = temp_path.close() {
                tracing::debug!(path = %self.path.display(), "failed to remove key file: {}", e);
            }
        }
    }
}

impl Drop for KeyFile {
    fn drop(&mut self) {
        self.remove_inner();
    }
}

impl std::fmt::Debug for KeyFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyFile").field("path", &self.path).finish()
    }
}
