//! Lifecycle overrides for custom build repositories

use super::{first_id, BuildLifecycle, DefaultLifecycle};
use crate::core::context::LifecycleContext;
use crate::dispatch::dispatch;
use crate::template::{render, TemplateVars};
use crate::utils::fileops::{join_relative, reset_build_dir};
use async_trait::async_trait;
use rbt_errors::{BuildError, Error};
use rbt_events::{AppEvent, BuildEvent, BuildLogLevel, EventEmitter};
use rbt_platform::{SpawnCommand, WorkingDirGuard};
use rbt_types::{Build, BuildId, LifecycleOp, ServerCommand};
use std::path::Path;

/// Wraps a base lifecycle and takes over builds of custom repositories
///
/// Every operation splits its batch with [`dispatch`]: builds of regular
/// repositories go to the wrapped lifecycle, the others get the custom
/// behavior configured on their repository.
#[derive(Debug, Clone, Default)]
pub struct CustomBuildLifecycle<L = DefaultLifecycle> {
    inner: L,
}

impl<L: BuildLifecycle> CustomBuildLifecycle<L> {
    #[must_use]
    pub fn new(inner: L) -> Self {
        Self { inner }
    }
}

async fn custom_checkout(ctx: &LifecycleContext, ids: &[BuildId]) -> Result<(), Error> {
    for build in ctx.store().browse(ids).await? {
        if skip_prebuilt(ctx, &build, LifecycleOp::Checkout) {
            continue;
        }

        let build_path = build.path(ctx.root());
        let target = match build.repo.build_dir() {
            Some(dir) => join_relative(&build_path, dir)?,
            None => build_path.clone(),
        };

        ctx.emit(AppEvent::Build(BuildEvent::CheckoutStarted {
            build_id: build.id,
            target: target.clone(),
        }));
        reset_build_dir(&build_path).await?;
        tokio::fs::create_dir_all(&target)
            .await
            .map_err(|e| Error::io_with_path(&e, &target))?;
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

async fn custom_pre_build(
    ctx: &LifecycleContext,
    ids: &[BuildId],
    lock_path: &Path,
    log_path: &Path,
) -> Result<(), Error> {
    let builds = ctx.store().browse(ids).await?;
    let cwd = WorkingDirGuard::save()?;
    // Anchor relative paths before the first enter
    let lock_path = cwd.resolve(lock_path);
    let log_path = cwd.resolve(log_path);

    for build in builds {
        if skip_prebuilt(ctx, &build, LifecycleOp::PreBuild) {
            continue;
        }
        let Some(template) = build
            .repo
            .custom_pre_build_cmd
            .as_ref()
            .filter(|t| !t.is_empty())
        else {
            continue;
        };

        let argv = match render(template, &TemplateVars::from_repository(&build.repo)) {
            Ok(argv) => argv,
            Err(e) => {
                ctx.emit_build_log(
                    build.id,
                    "pre_build",
                    BuildLogLevel::Warning,
                    format!("pre-build command skipped: {e}"),
                );
                continue;
            }
        };
        let command = SpawnCommand::from_args(argv.clone())?;

        let working_dir = cwd.resolve(&build.path(ctx.root()));
        cwd.enter(&working_dir)?;
        ctx.emit(AppEvent::Build(BuildEvent::PreBuildStarted {
            build_id: build.id,
            command: argv.clone(),
            working_dir,
        }));

        let outcome = ctx
            .spawner()
            .spawn(ctx.platform(), &command, &lock_path, &log_path)
            .await?;
        ctx.emit(AppEvent::Build(BuildEvent::PreBuildCompleted {
            build_id: build.id,
            exit_code: outcome.exit_code,
        }));

        if !outcome.success() {
            return Err(BuildError::PreBuildFailed {
                build: build.id.0,
                command: argv.join(" "),
                exit_code: outcome.exit_code,
            }
            .into());
        }
    }
    Ok(())
}

async fn custom_build_command(
    ctx: &LifecycleContext,
    ids: &[BuildId],
) -> Result<ServerCommand, Error> {
    let build = ctx
        .store()
        .get(first_id(ids, LifecycleOp::BuildCommand)?)
        .await?;
    let runner = ctx.runner();

    let server_path = build
        .repo
        .custom_server_path
        .as_deref()
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| BuildError::MissingServerPath {
            repo: build.repo.name.clone(),
        })?;
    let server_path = build.subpath(ctx.root(), server_path);

    let params = match &build.repo.custom_server_params {
        Some(template) => render(template, &TemplateVars::from_repository(&build.repo))
            .unwrap_or_else(|e| {
                ctx.emit_build_log(
                    build.id,
                    "build_command",
                    BuildLogLevel::Warning,
                    format!("custom server parameters ignored: {e}"),
                );
                Vec::new()
            }),
        None => Vec::new(),
    };

    let mut args = vec![
        runner.interpreter.clone(),
        server_path.display().to_string(),
        "--no-xmlrpcs".to_string(),
        format!("--xmlrpc-port={}", build.port),
        format!("--db_user={}", runner.db_user),
        "--workers=0".to_string(),
    ];
    args.extend(params);

    let command = ServerCommand {
        args,
        modules: build.repo.modules_or_default(),
    };
    ctx.emit(AppEvent::Build(BuildEvent::CommandBuilt {
        build_id: build.id,
        command: command.args.clone(),
        modules: command.modules.clone(),
    }));
    Ok(command)
}

fn skip_prebuilt(ctx: &LifecycleContext, build: &Build, operation: LifecycleOp) -> bool {
    if build.prebuilt {
        ctx.emit(AppEvent::Build(BuildEvent::Skipped {
            build_id: build.id,
            operation,
            reason: "already prebuilt".to_string(),
        }));
    }
    build.prebuilt
}

#[async_trait]
impl<L: BuildLifecycle> BuildLifecycle for CustomBuildLifecycle<L> {
    async fn checkout(&self, ctx: &LifecycleContext, ids: &[BuildId]) -> Result<(), Error> {
        dispatch(
            ctx,
            LifecycleOp::Checkout,
            ids,
            |regular| async move {
                self.inner
                    .checkout(ctx, &regular)
                    .await
                    .map(|()| None::<()>)
            },
            |custom| async move { custom_checkout(ctx, &custom).await.map(|()| None) },
        )
        .await?;
        Ok(())
    }

    async fn pre_build(
        &self,
        ctx: &LifecycleContext,
        ids: &[BuildId],
        lock_path: &Path,
        log_path: &Path,
    ) -> Result<(), Error> {
        dispatch(
            ctx,
            LifecycleOp::PreBuild,
            ids,
            |regular| async move {
                self.inner
                    .pre_build(ctx, &regular, lock_path, log_path)
                    .await
                    .map(|()| None::<()>)
            },
            |custom| async move {
                custom_pre_build(ctx, &custom, lock_path, log_path)
                    .await
                    .map(|()| None)
            },
        )
        .await?;
        Ok(())
    }

    async fn build_command(
        &self,
        ctx: &LifecycleContext,
        ids: &[BuildId],
    ) -> Result<ServerCommand, Error> {
        dispatch(
            ctx,
            LifecycleOp::BuildCommand,
            ids,
            |regular| async move { self.inner.build_command(ctx, &regular).await.map(Some) },
            |custom| async move { custom_build_command(ctx, &custom).await.map(Some) },
        )
        .await?
        .ok_or_else(|| {
            BuildError::EmptyBatch {
                operation: LifecycleOp::BuildCommand.to_string(),
            }
            .into()
        })
    }
}
