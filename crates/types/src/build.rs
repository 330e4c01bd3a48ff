//! Build attempt records

use crate::repository::Repository;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Build record identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildId(pub i64);

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for BuildId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl BuildId {
    /// Drop repeated ids, keeping first occurrences in order
    #[must_use]
    pub fn unique(ids: &[BuildId]) -> Vec<BuildId> {
        let mut seen = std::collections::HashSet::with_capacity(ids.len());
        ids.iter().copied().filter(|id| seen.insert(*id)).collect()
    }
}

/// One attempt to build and test a source revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
    pub id: BuildId,
    /// Treeish exported at checkout
    pub name: String,
    /// Directory name under `<root>/build`
    pub dest: String,
    pub port: u16,
    /// Checkout and pre-build already ran for this attempt
    pub prebuilt: bool,
    pub repo: Repository,
}

impl Build {
    /// Working directory of the build
    #[must_use]
    pub fn path(&self, root: &Path) -> PathBuf {
        root.join("build").join(&self.dest)
    }

    /// Path below the build's working directory
    #[must_use]
    pub fn subpath(&self, root: &Path, sub: impl AsRef<Path>) -> PathBuf {
        self.path(root).join(sub)
    }

    /// Whether the owning repository opts into custom builds
    #[must_use]
    pub fn is_custom(&self) -> bool {
        self.repo.is_custom_build
    }
}
