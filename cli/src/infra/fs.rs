//! Filesystem infrastructure — implements the `LocalFs` port with atomic
//! writes (temp file + rename) so an interrupted run never leaves a
//! partially written resource behind.

use std::path::Path;

use anyhow::{Context, Result};

use crate::application::ports::LocalFs;

/// Production filesystem implementation of `LocalFs`.
pub struct StdFs;

impl LocalFs for StdFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("creating directory {}", path.display()))
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        std::fs::read(path).with_context(|| format!("reading file {}", path.display()))
    }

    fn write_atomic(&self, path: &Path, content: &[u8], mode: Option<u32>) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("{} has no parent directory", path.display()))?;

        let mut temp = tempfile::NamedTempFile::new_in(parent)
            .with_context(|| format!("staging write for {}", path.display()))?;
        std::io::Write::write_all(&mut temp, content)
            .with_context(|| format!("writing temp file for {}", path.display()))?;

        #[cfg(unix)]
        if let Some(mode) = mode {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(temp.path(), std::fs::Permissions::from_mode(mode))
                .with_context(|| format!("setting permissions on {}", path.display()))?;
        }
        #[cfg(not(unix))]
        let _ = mode;

        temp.persist(path)
            .with_context(|| format!("finalizing file {}", path.display()))?;
        Ok(())
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
