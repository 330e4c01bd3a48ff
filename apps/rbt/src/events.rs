//! Event handling and user feedback

use crate::logging::{describe, log_event_with_tracing};
use rbt_events::{AppEvent, BuildEvent, BuildLogLevel};

/// Event handler forwarding events to tracing and echoing the important ones
pub struct EventHandler {
    /// Whether debug mode is enabled
    debug_enabled: bool,
}

impl EventHandler {
    pub fn new(debug_enabled: bool) -> Self {
        Self { debug_enabled }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, event: AppEvent) {
        log_event_with_tracing(&event);

        match &event {
            AppEvent::Build(BuildEvent::Log { level, .. }) => {
                let prefix = match level {
                    BuildLogLevel::Info => "",
                    BuildLogLevel::Warning => "warning: ",
                    BuildLogLevel::Error => "error: ",
                };
                eprintln!("{prefix}{}", describe(&event));
            }
            _ if self.debug_enabled => eprintln!("{}", describe(&event)),
            _ => {}
        }
    }
}
