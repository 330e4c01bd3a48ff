use serde::{Deserialize, Serialize};

use rbt_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    pub retryable: bool,
}

impl FailureContext {
    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self {
            code: error.user_code().map(Into::into),
            message: error.user_message().into_owned(),
            hint: error.user_hint().map(Into::into),
            retryable: error.is_retryable(),
        }
    }
}

pub mod build;
pub mod general;
pub mod platform;

pub use build::*;
pub use general::*;
pub use platform::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// Top-level operation events
    General(GeneralEvent),

    /// Build lifecycle events (dispatch, checkout, pre-build, build log)
    Build(BuildEvent),

    /// Process and filesystem operations
    Platform(PlatformEvent),
}

impl AppEvent {
    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;

        match self {
            Self::General(GeneralEvent::OperationFailed { .. })
            | Self::Build(BuildEvent::Log {
                level: BuildLogLevel::Error,
                ..
            })
            | Self::Platform(PlatformEvent::ProcessFailed { .. }) => Level::ERROR,

            Self::Build(BuildEvent::Log {
                level: BuildLogLevel::Warning,
                ..
            }) => Level::WARN,

            Self::Build(BuildEvent::Dispatched { .. } | BuildEvent::Skipped { .. })
            | Self::Platform(PlatformEvent::LockAcquired { .. }) => Level::DEBUG,

            _ => Level::INFO,
        }
    }

    /// Get the log target for this event (for structured logging)
    #[must_use]
    pub fn log_target(&self) -> &'static str {
        match self {
            Self::General(_) => "rbt::events::general",
            Self::Build(_) => "rbt::events::build",
            Self::Platform(_) => "rbt::events::platform",
        }
    }
}
