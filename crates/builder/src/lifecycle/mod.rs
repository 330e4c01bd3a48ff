//! Build lifecycle operations

mod custom;
mod default;

pub use custom::CustomBuildLifecycle;
pub use default::DefaultLifecycle;

use crate::core::context::LifecycleContext;
use async_trait::async_trait;
use rbt_errors::{BuildError, Error};
use rbt_types::{BuildId, LifecycleOp, ServerCommand};
use std::path::Path;

/// Per-build lifecycle steps run by the runner
#[async_trait]
pub trait BuildLifecycle: Send + Sync {
    /// Prepare fresh build directories and export sources into them
    async fn checkout(&self, ctx: &LifecycleContext, ids: &[BuildId]) -> Result<(), Error>;

    /// Run commands required before the build proper
    async fn pre_build(
        &self,
        ctx: &LifecycleContext,
        ids: &[BuildId],
        lock_path: &Path,
        log_path: &Path,
    ) -> Result<(), Error>;

    /// Launch command of the server for the first build of `ids`
    async fn build_command(
        &self,
        ctx: &LifecycleContext,
        ids: &[BuildId],
    ) -> Result<ServerCommand, Error>;
}

/// Fail on empty batches for operations that need a record
pub(crate) fn first_id(ids: &[BuildId], operation: LifecycleOp) -> Result<BuildId, Error> {
    ids.first().copied().ok_or_else(|| {
        BuildError::EmptyBatch {
            operation: operation.to_string(),
        }
        .into()
    })
}
