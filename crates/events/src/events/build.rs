use rbt_types::{BuildId, LifecycleOp};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Severity of a build log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildLogLevel {
    Info,
    Warning,
    Error,
}

/// Build lifecycle events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BuildEvent {
    /// Entry in the per-build log
    Log {
        build_id: BuildId,
        step: String,
        level: BuildLogLevel,
        message: String,
    },

    /// A batch was split between the default and the custom lifecycle
    Dispatched {
        operation: LifecycleOp,
        regular: Vec<BuildId>,
        custom: Vec<BuildId>,
    },

    /// A record was left untouched by an operation
    Skipped {
        build_id: BuildId,
        operation: LifecycleOp,
        reason: String,
    },

    CheckoutStarted {
        build_id: BuildId,
        target: PathBuf,
    },

    CheckoutCompleted {
        build_id: BuildId,
        target: PathBuf,
    },

    PreBuildStarted {
        build_id: BuildId,
        command: Vec<String>,
        working_dir: PathBuf,
    },

    PreBuildCompleted {
        build_id: BuildId,
        exit_code: Option<i32>,
    },

    /// Launch command constructed for a build
    CommandBuilt {
        build_id: BuildId,
        command: Vec<String>,
        modules: Vec<String>,
    },

    /// Checkout and pre-build are done for good
    MarkedPrebuilt {
        build_id: BuildId,
    },
}
