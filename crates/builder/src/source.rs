//! Source export from the runner's repository clones

use async_trait::async_trait;
use rbt_errors::{BuildError, Error};
use rbt_types::Repository;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Writes the tree of a revision into a directory
#[async_trait]
pub trait SourceExporter: Send + Sync {
    /// Export `treeish` of `repo` into `target`, which must already exist
    async fn export(&self, repo: &Repository, treeish: &str, target: &Path) -> Result<(), Error>;
}

/// Exporter reading the bare clones under `<root>/repo`
#[derive(Debug, Clone)]
pub struct GitExporter {
    root: PathBuf,
}

impl GitExporter {
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }
}

#[async_trait]
impl SourceExporter for GitExporter {
    async fn export(&self, repo: &Repository, treeish: &str, target: &Path) -> Result<(), Error> {
        let fail = |message: String| BuildError::ExportFailed {
            treeish: treeish.to_string(),
            target: target.display().to_string(),
            message,
        };

        let git = which::which("git").map_err(|e| fail(format!("git not found: {e}")))?;
        let git_dir = repo.git_dir(&self.root);

        let output = tokio::process::Command::new(git)
            .arg(format!("--git-dir={}", git_dir.display()))
            .args(["archive", treeish])
            .output()
            .await
            .map_err(|e| fail(e.to_string()))?;

        if !output.status.success() {
            return Err(fail(format!(
                "git archive failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ))
            .into());
        }

        let dest = target.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let mut archive = tar::Archive::new(Cursor::new(output.stdout));
            archive.set_preserve_permissions(true);
            archive.unpack(&dest)
        })
        .await
        .map_err(|e| Error::internal(format!("export task failed: {e}")))?
        .map_err(|e| fail(format!("failed to unpack archive: {e}")))?;

        Ok(())
    }
}
