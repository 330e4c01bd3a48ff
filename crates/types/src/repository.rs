//! Repository build policy

use crate::command::CommandTemplate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Module loaded when a repository does not list any
pub const DEFAULT_MODULE: &str = "base";

/// Repository record identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepoId(pub i64);

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Build policy for one source repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub id: RepoId,
    /// Remote identity, e.g. `https://github.com/odoo/odoo.git`
    pub name: String,
    /// Modules installed when the server starts
    #[serde(default)]
    pub modules: Option<Vec<String>>,
    #[serde(default)]
    pub is_custom_build: bool,
    /// Subdirectory of the build path receiving the sources
    #[serde(default)]
    pub custom_build_dir: Option<String>,
    /// Server entrypoint, relative to the build path
    #[serde(default)]
    pub custom_server_path: Option<String>,
    #[serde(default)]
    pub custom_pre_build_cmd: Option<CommandTemplate>,
    #[serde(default)]
    pub custom_server_params: Option<CommandTemplate>,
}

impl Repository {
    /// Repository with default policy
    #[must_use]
    pub fn new(id: RepoId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            modules: None,
            is_custom_build: false,
            custom_build_dir: None,
            custom_server_path: None,
            custom_pre_build_cmd: None,
            custom_server_params: None,
        }
    }

    /// Filesystem-safe form of the repository name
    #[must_use]
    pub fn slug(&self) -> String {
        self.name
            .chars()
            .map(|c| match c {
                '/' | ':' | '@' | '\\' => '_',
                other => other,
            })
            .collect()
    }

    /// Location of the local bare clone under the runner root
    #[must_use]
    pub fn git_dir(&self, root: &Path) -> PathBuf {
        root.join("repo").join(self.slug())
    }

    /// Checkout subdirectory, ignoring empty values
    #[must_use]
    pub fn build_dir(&self) -> Option<&str> {
        self.custom_build_dir
            .as_deref()
            .filter(|dir| !dir.trim().is_empty())
    }

    /// Module list with the base fallback applied
    #[must_use]
    pub fn modules_or_default(&self) -> Vec<String> {
        match &self.modules {
            Some(modules) if !modules.is_empty() => modules.clone(),
            _ => vec![DEFAULT_MODULE.to_string()],
        }
    }
}
