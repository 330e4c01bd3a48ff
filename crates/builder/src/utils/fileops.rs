//! File system operations for build directories

use rbt_errors::{BuildError, Error};
use std::path::{Component, Path, PathBuf};
use tokio::fs;

/// Replace `build_path` with an empty directory holding a `logs` subdirectory
pub async fn reset_build_dir(build_path: &Path) -> Result<(), Error> {
    if fs::try_exists(build_path)
        .await
        .map_err(|e| Error::io_with_path(&e, build_path))?
    {
        fs::remove_dir_all(build_path)
            .await
            .map_err(|e| Error::io_with_path(&e, build_path))?;
    }

    let logs = build_path.join("logs");
    fs::create_dir_all(&logs)
        .await
        .map_err(|e| Error::io_with_path(&e, &logs))?;
    Ok(())
}

/// Join a repository-configured subdirectory onto `base`
///
/// Only plain relative paths are accepted so checkouts cannot escape the
/// build directory.
pub fn join_relative(base: &Path, sub: &str) -> Result<PathBuf, BuildError> {
    let invalid = |reason: &str| BuildError::InvalidPath {
        path: sub.to_string(),
        reason: reason.to_string(),
    };

    let sub_path = Path::new(sub);
    for component in sub_path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => return Err(invalid("parent directory components are not allowed")),
            Component::RootDir | Component::Prefix(_) => return Err(invalid("path must be relative")),
        }
    }
    Ok(base.join(sub_path))
}
