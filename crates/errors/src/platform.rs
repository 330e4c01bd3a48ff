//! Platform operation errors (process spawning, locks, working directory)

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

/// Errors that can occur while talking to the operating system
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum PlatformError {
    #[error("process execution failed: {command} - {message}")]
    ProcessExecutionFailed { command: String, message: String },

    #[error("empty command line")]
    EmptyCommand,

    #[error("failed to lock {path}: {message}")]
    LockFailed { path: String, message: String },

    #[error("failed to open log file {path}: {message}")]
    LogFileFailed { path: String, message: String },

    #[error("failed to change working directory to {path}: {message}")]
    WorkingDirFailed { path: String, message: String },
}

impl UserFacingError for PlatformError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::LockFailed { .. } => Some("Another job may be holding the lock file."),
            Self::LogFileFailed { .. } => Some("Ensure the build log directory exists and is writable."),
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::LockFailed { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::ProcessExecutionFailed { .. } => "platform.process_execution_failed",
            Self::EmptyCommand => "platform.empty_command",
            Self::LockFailed { .. } => "platform.lock_failed",
            Self::LogFileFailed { .. } => "platform.log_file_failed",
            Self::WorkingDirFailed { .. } => "platform.working_dir_failed",
        };
        Some(code)
    }
}
