//! Record store error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum StateError {
    #[error("build not found: {id}")]
    BuildNotFound { id: i64 },

    #[error("repository not found: {name}")]
    RepositoryNotFound { name: String },

    #[error("invalid record {table}#{id}: {message}")]
    InvalidRecord {
        table: String,
        id: i64,
        message: String,
    },

    #[error("database error: {message}")]
    DatabaseError { message: String },

    #[error("migration failed: {message}")]
    MigrationFailed { message: String },
}

impl UserFacingError for StateError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::MigrationFailed { .. } => Some("Run `rbt migrate` against a writable database."),
            Self::InvalidRecord { .. } => {
                Some("Fix the stored record; templates are plain text or a JSON string array.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::DatabaseError { .. })
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::BuildNotFound { .. } => "state.build_not_found",
            Self::RepositoryNotFound { .. } => "state.repository_not_found",
            Self::InvalidRecord { .. } => "state.invalid_record",
            Self::DatabaseError { .. } => "state.database_error",
            Self::MigrationFailed { .. } => "state.migration_failed",
        };
        Some(code)
    }
}
