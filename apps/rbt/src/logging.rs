//! Structured logging integration for events
//!
//! Events are forwarded to `tracing` under their domain target at the level
//! the event reports for itself.

use rbt_events::{AppEvent, BuildEvent, GeneralEvent, PlatformEvent};
use tracing::Level;

/// `tracing` needs literal targets and levels, so pick the macro at runtime
macro_rules! event_at {
    ($target:literal, $level:expr, $($rest:tt)+) => {{
        let level = $level;
        if level == Level::ERROR {
            tracing::error!(target: $target, $($rest)+);
        } else if level == Level::WARN {
            tracing::warn!(target: $target, $($rest)+);
        } else if level == Level::INFO {
            tracing::info!(target: $target, $($rest)+);
        } else if level == Level::DEBUG {
            tracing::debug!(target: $target, $($rest)+);
        } else {
            tracing::trace!(target: $target, $($rest)+);
        }
    }};
}

/// Log an `AppEvent` with structured fields
pub fn log_event_with_tracing(event: &AppEvent) {
    let level = event.log_level();
    let summary = describe(event);

    match event {
        AppEvent::General(_) => {
            event_at!("rbt::events::general", level, "{summary}");
        }
        AppEvent::Build(build_event) => {
            let build_id = build_id_of(build_event).map(|id| id.0);
            event_at!("rbt::events::build", level, build_id = ?build_id, "{summary}");
        }
        AppEvent::Platform(_) => {
            event_at!("rbt::events::platform", level, "{summary}");
        }
    }
}

fn build_id_of(event: &BuildEvent) -> Option<rbt_types::BuildId> {
    match event {
        BuildEvent::Log { build_id, .. }
        | BuildEvent::Skipped { build_id, .. }
        | BuildEvent::CheckoutStarted { build_id, .. }
        | BuildEvent::CheckoutCompleted { build_id, .. }
        | BuildEvent::PreBuildStarted { build_id, .. }
        | BuildEvent::PreBuildCompleted { build_id, .. }
        | BuildEvent::CommandBuilt { build_id, .. }
        | BuildEvent::MarkedPrebuilt { build_id } => Some(*build_id),
        BuildEvent::Dispatched { .. } => None,
    }
}

/// One-line human description of an event
pub fn describe(event: &AppEvent) -> String {
    match event {
        AppEvent::General(general) => match general {
            GeneralEvent::OperationStarted { operation } => format!("{operation} started"),
            GeneralEvent::OperationCompleted { operation, success } => {
                format!("{operation} completed (success: {success})")
            }
            GeneralEvent::OperationFailed { operation, error } => {
                format!("{operation} failed: {error}")
            }
        },
        AppEvent::Build(build) => match build {
            BuildEvent::Log {
                build_id,
                step,
                message,
                ..
            } => format!("[build {build_id}] {step}: {message}"),
            BuildEvent::Dispatched {
                operation,
                regular,
                custom,
            } => format!(
                "{operation}: {} regular, {} custom build(s)",
                regular.len(),
                custom.len()
            ),
            BuildEvent::Skipped {
                build_id,
                operation,
                reason,
            } => format!("[build {build_id}] {operation} skipped: {reason}"),
            BuildEvent::CheckoutStarted { build_id, target } => {
                format!("[build {build_id}] checking out into {}", target.display())
            }
            BuildEvent::CheckoutCompleted { build_id, target } => {
                format!("[build {build_id}] checked out into {}", target.display())
            }
            BuildEvent::PreBuildStarted {
                build_id,
                command,
                working_dir,
            } => format!(
                "[build {build_id}] running {:?} in {}",
                command,
                working_dir.display()
            ),
            BuildEvent::PreBuildCompleted {
                build_id,
                exit_code,
            } => format!("[build {build_id}] pre-build exited with {exit_code:?}"),
            BuildEvent::CommandBuilt {
                build_id, command, ..
            } => format!("[build {build_id}] command: {}", command.join(" ")),
            BuildEvent::MarkedPrebuilt { build_id } => format!("[build {build_id}] prebuilt"),
        },
        AppEvent::Platform(platform) => match platform {
            PlatformEvent::LockAcquired { path } => format!("locked {}", path.display()),
            PlatformEvent::ProcessStarted { command, .. } => {
                format!("spawned {}", command.join(" "))
            }
            PlatformEvent::ProcessCompleted {
                command,
                exit_code,
                duration_ms,
                ..
            } => format!(
                "{} exited with {exit_code:?} after {duration_ms}ms",
                command.join(" ")
            ),
            PlatformEvent::ProcessFailed {
                command, failure, ..
            } => format!("{} failed: {}", command.join(" "), failure.message),
        },
    }
}
