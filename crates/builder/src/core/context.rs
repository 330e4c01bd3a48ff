//! Lifecycle context shared by every build operation

use crate::source::{GitExporter, SourceExporter};
use rbt_config::RunnerConfig;
use rbt_events::{EventEmitter, EventSender};
use rbt_platform::{LocalSpawner, PlatformContext, ProcessSpawner};
use rbt_state::BuildStore;
use std::path::Path;
use std::sync::Arc;

/// Collaborators and settings injected into lifecycle operations
#[derive(Clone)]
pub struct LifecycleContext {
    store: Arc<dyn BuildStore>,
    spawner: Arc<dyn ProcessSpawner>,
    exporter: Arc<dyn SourceExporter>,
    runner: RunnerConfig,
    /// Event sender for build logs and milestones
    event_sender: Option<EventSender>,
    platform: PlatformContext,
}

impl std::fmt::Debug for LifecycleContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleContext")
            .field("runner", &self.runner)
            .field("event_sender", &self.event_sender.is_some())
            .finish_non_exhaustive()
    }
}

impl EventEmitter for LifecycleContext {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

impl LifecycleContext {
    /// Context spawning locally and exporting from the runner's git clones
    #[must_use]
    pub fn new(store: Arc<dyn BuildStore>, runner: RunnerConfig) -> Self {
        let exporter = Arc::new(GitExporter::new(&runner.root));
        Self {
            store,
            spawner: Arc::new(LocalSpawner::new()),
            exporter,
            runner,
            event_sender: None,
            platform: PlatformContext::default(),
        }
    }

    /// Set event sender
    #[must_use]
    pub fn with_event_sender(mut self, event_sender: EventSender) -> Self {
        self.platform = PlatformContext::new(Some(event_sender.clone()));
        self.event_sender = Some(event_sender);
        self
    }

    #[must_use]
    pub fn with_spawner(mut self, spawner: Arc<dyn ProcessSpawner>) -> Self {
        self.spawner = spawner;
        self
    }

    #[must_use]
    pub fn with_exporter(mut self, exporter: Arc<dyn SourceExporter>) -> Self {
        self.exporter = exporter;
        self
    }

    #[must_use]
    pub fn store(&self) -> &dyn BuildStore {
        &*self.store
    }

    #[must_use]
    pub fn spawner(&self) -> &dyn ProcessSpawner {
        &*self.spawner
    }

    #[must_use]
    pub fn exporter(&self) -> &dyn SourceExporter {
        &*self.exporter
    }

    #[must_use]
    pub fn runner(&self) -> &RunnerConfig {
        &self.runner
    }

    /// Runner root; builds live below `<root>/build`
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.runner.root
    }

    /// Context handed to the spawner
    #[must_use]
    pub fn platform(&self) -> &PlatformContext {
        &self.platform
    }
}
