//! Command templates and launch commands

use serde::{Deserialize, Serialize};
use std::fmt;

/// Command template configured on a repository
///
/// A single string is split on whitespace before substitution; a token list
/// is used as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandTemplate {
    Line(String),
    Tokens(Vec<String>),
}

impl CommandTemplate {
    /// Template tokens, prior to variable substitution
    #[must_use]
    pub fn tokens(&self) -> Vec<&str> {
        match self {
            Self::Line(line) => line.split_whitespace().collect(),
            Self::Tokens(tokens) => tokens.iter().map(String::as_str).collect(),
        }
    }

    /// True when the template yields no tokens
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Line(line) => line.trim().is_empty(),
            Self::Tokens(tokens) => tokens.is_empty(),
        }
    }
}

impl From<&str> for CommandTemplate {
    fn from(line: &str) -> Self {
        Self::Line(line.to_string())
    }
}

impl From<Vec<String>> for CommandTemplate {
    fn from(tokens: Vec<String>) -> Self {
        Self::Tokens(tokens)
    }
}

/// Server launch command together with the modules to install
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerCommand {
    pub args: Vec<String>,
    pub modules: Vec<String>,
}

impl ServerCommand {
    /// Executable, i.e. the first argument
    #[must_use]
    pub fn program(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    /// Comma-separated module list as expected by `-i`
    #[must_use]
    pub fn modules_arg(&self) -> String {
        self.modules.join(",")
    }
}

impl fmt::Display for ServerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.args.join(" "))
    }
}

/// Lifecycle operation routed by the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleOp {
    Checkout,
    PreBuild,
    BuildCommand,
}

impl LifecycleOp {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Checkout => "checkout",
            Self::PreBuild => "pre_build",
            Self::BuildCommand => "build_command",
        }
    }
}

impl fmt::Display for LifecycleOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
