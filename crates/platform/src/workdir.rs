//! Process working directory handling

use rbt_errors::PlatformError;
use std::path::{Path, PathBuf};

/// Saves the current directory and restores it when dropped
///
/// The working directory is process-wide state; holders must not overlap
/// across threads.
#[derive(Debug)]
pub struct WorkingDirGuard {
    saved: PathBuf,
}

impl WorkingDirGuard {
    /// Remember the current directory
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be read.
    pub fn save() -> Result<Self, PlatformError> {
        let saved = std::env::current_dir().map_err(|e| PlatformError::WorkingDirFailed {
            path: ".".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { saved })
    }

    /// Change into `dir`; the saved directory is still restored on drop
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` cannot be entered.
    pub fn enter(&self, dir: &Path) -> Result<(), PlatformError> {
        std::env::set_current_dir(dir).map_err(|e| PlatformError::WorkingDirFailed {
            path: dir.display().to_string(),
            message: e.to_string(),
        })
    }

    #[must_use]
    pub fn saved(&self) -> &Path {
        &self.saved
    }

    /// Anchor a relative `path` at the saved directory
    ///
    /// Paths resolved this way stay valid after [`enter`](Self::enter).
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.saved.join(path)
        }
    }
}

impl Drop for WorkingDirGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.saved);
    }
}
