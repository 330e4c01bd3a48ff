//! Base runner lifecycle

use super::{first_id, BuildLifecycle};
use crate::core::context::LifecycleContext;
use crate::utils::fileops::reset_build_dir;
use async_trait::async_trait;
use rbt_errors::{BuildError, Error};
use rbt_events::{AppEvent, BuildEvent, EventEmitter};
use rbt_types::{BuildId, LifecycleOp, ServerCommand};
use std::path::Path;

/// Lifecycle used for repositories without custom build policy
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultLifecycle;

impl DefaultLifecycle {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BuildLifecycle for DefaultLifecycle {
    async fn checkout(&self, ctx: &LifecycleContext, ids: &[BuildId]) -> Result<(), Error> {
        for build in ctx.store().browse(ids).await? {
            if build.prebuilt {
                ctx.emit(AppEvent::Build(BuildEvent::Skipped {
                    build_id: build.id,
                    operation: LifecycleOp::Checkout,
                    reason: "already prebuilt".to_string(),
                }));
                continue;
            }

            let target = build.path(ctx.root());
            ctx.emit(AppEvent::Build(BuildEvent::CheckoutStarted {
                build_id: build.id,
                target: target.clone(),
            }));
            reset_build_dir(&target).await?;
            ctx.exporter()
                .export(&build.repo, &build.name, &target)
                .await?;
            ctx.emit(AppEvent::Build(BuildEvent::CheckoutCompleted {
                build_id: build.id,
                target,
            }));
        }
        Ok(())
    }

    async fn pre_build(
        &self,
        _ctx: &LifecycleContext,
        _ids: &[BuildId],
        _lock_path: &Path,
        _log_path: &Path,
    ) -> Result<(), Error> {
        Ok(())
    }

    async fn build_command(
        &self,
        ctx: &LifecycleContext,
        ids: &[BuildId],
    ) -> Result<ServerCommand, Error> {
        let build = ctx
            .store()
            .get(first_id(ids, LifecycleOp::BuildCommand)?)
            .await?;
        let runner = ctx.runner();

        let candidates = &runner.server_candidates;
        let entry = candidates
            .iter()
            .map(|candidate| build.subpath(ctx.root(), candidate))
            .find(|path| path.exists())
            .or_else(|| candidates.first().map(|c| build.subpath(ctx.root(), c)))
            .ok_or_else(|| BuildError::Failed {
                message: "no server entrypoint candidates configured".to_string(),
            })?;

        let command = ServerCommand {
            args: vec![
                runner.interpreter.clone(),
                entry.display().to_string(),
                "--no-xmlrpcs".to_string(),
                format!("--xmlrpc-port={}", build.port),
            ],
            modules: build.repo.modules_or_default(),
        };

        ctx.emit(AppEvent::Build(BuildEvent::CommandBuilt {
            build_id: build.id,
            command: command.args.clone(),
            modules: command.modules.clone(),
        }));
        Ok(command)
    }
}
