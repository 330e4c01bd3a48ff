//! Core platform context

use rbt_errors::PlatformError;
use rbt_events::{AppEvent, EventEmitter, EventSender, FailureContext, PlatformEvent};
use std::time::Duration;

/// Context for platform operations, carrying the optional event sender
#[derive(Debug, Clone, Default)]
pub struct PlatformContext {
    event_sender: Option<EventSender>,
}

impl PlatformContext {
    /// Create a new platform context with event emission capabilities
    #[must_use]
    pub fn new(event_sender: Option<EventSender>) -> Self {
        Self { event_sender }
    }

    pub(crate) fn emit_process_failed(
        &self,
        command: &[String],
        error: &PlatformError,
        duration: Duration,
    ) {
        self.emit(AppEvent::Platform(PlatformEvent::ProcessFailed {
            command: command.to_vec(),
            failure: FailureContext::from_error(error),
            duration_ms: duration_to_millis(duration),
        }));
    }
}

impl EventEmitter for PlatformContext {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

pub(crate) fn duration_to_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
