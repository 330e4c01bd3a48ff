//! Process operation events

use super::FailureContext;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Events emitted around spawned processes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum PlatformEvent {
    /// Exclusive lock taken on a job lock file
    LockAcquired { path: PathBuf },

    ProcessStarted {
        /// Program and arguments
        command: Vec<String>,
        /// Working directory inherited by the child
        cwd: Option<PathBuf>,
        /// File receiving stdout and stderr
        log_path: PathBuf,
    },

    ProcessCompleted {
        command: Vec<String>,
        pid: Option<u32>,
        exit_code: Option<i32>,
        duration_ms: u64,
    },

    ProcessFailed {
        command: Vec<String>,
        failure: FailureContext,
        duration_ms: u64,
    },
}
