//! Advisory job lock files

use fs2::FileExt;
use rbt_errors::PlatformError;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Exclusive advisory lock, released on drop
#[derive(Debug)]
pub struct JobLock {
    file: File,
    path: PathBuf,
}

impl JobLock {
    /// Take the lock without blocking
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::LockFailed`] if the file cannot be opened or
    /// another holder already owns the lock.
    pub fn acquire(path: &Path) -> Result<Self, PlatformError> {
        let fail = |e: std::io::Error| PlatformError::LockFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(fail)?;
            }
        }
        // No truncation: the file may be held by another process
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(fail)?;
        file.try_lock_exclusive().map_err(fail)?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for JobLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}
