//! Build lifecycle error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum BuildError {
    #[error("build failed: {message}")]
    Failed { message: String },

    #[error("export of {treeish} into {target} failed: {message}")]
    ExportFailed {
        treeish: String,
        target: String,
        message: String,
    },

    #[error("pre-build command for build {build} exited with {exit_code:?}: {command}")]
    PreBuildFailed {
        build: i64,
        command: String,
        exit_code: Option<i32>,
    },

    #[error("invalid command template {template:?}: {reason}")]
    TemplateError { template: String, reason: String },

    #[error("repository {repo} has no custom server path")]
    MissingServerPath { repo: String },

    #[error("invalid path: {path} - {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("empty build batch for {operation}")]
    EmptyBatch { operation: String },
}

impl UserFacingError for BuildError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::ExportFailed { .. } => {
                Some("Check that the repository clone exists and contains the requested revision.")
            }
            Self::PreBuildFailed { .. } => {
                Some("Inspect the build log for the pre-build command output.")
            }
            Self::TemplateError { .. } => Some(
                "Only %(custom_build_dir)s, %(custom_server_path)s and %% are supported in templates.",
            ),
            Self::MissingServerPath { .. } => {
                Some("Set custom_server_path on the repository or disable custom builds.")
            }
            Self::InvalidPath { .. } => {
                Some("Use a relative directory name without '..' components.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::ExportFailed { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::Failed { .. } => "build.failed",
            Self::ExportFailed { .. } => "build.export_failed",
            Self::PreBuildFailed { .. } => "build.pre_build_failed",
            Self::TemplateError { .. } => "build.template_error",
            Self::MissingServerPath { .. } => "build.missing_server_path",
            Self::InvalidPath { .. } => "build.invalid_path",
            Self::EmptyBatch { .. } => "build.empty_batch",
        };
        Some(code)
    }
}
