//! Pre-build job run by the runner before testing a build

use crate::core::context::LifecycleContext;
use crate::lifecycle::BuildLifecycle;
use rbt_errors::Error;
use rbt_events::{AppEvent, BuildEvent, BuildLogLevel, EventEmitter};
use rbt_types::BuildId;
use std::path::Path;

/// Build log step the job reports under
pub const PREBUILD_STEP: &str = "test_base";

/// Check out a build, run its pre-build commands and mark it prebuilt
///
/// Builds already marked prebuilt pass through checkout and pre-build
/// untouched.
///
/// # Errors
///
/// Returns the first failure of checkout, pre-build or the store update; the
/// build is left unmarked in that case.
pub async fn run_prebuild_job<L>(
    lifecycle: &L,
    ctx: &LifecycleContext,
    build_id: BuildId,
    lock_path: &Path,
    log_path: &Path,
) -> Result<(), Error>
where
    L: BuildLifecycle + ?Sized,
{
    ctx.emit_build_log(
        build_id,
        PREBUILD_STEP,
        BuildLogLevel::Info,
        "Start pre-build commands",
    );

    lifecycle.checkout(ctx, &[build_id]).await?;

    let build = ctx.store().get(build_id).await?;
    if build.is_custom() {
        lifecycle
            .pre_build(ctx, &[build_id], lock_path, log_path)
            .await?;
    }

    ctx.store().mark_prebuilt(build_id).await?;
    ctx.emit(AppEvent::Build(BuildEvent::MarkedPrebuilt { build_id }));
    Ok(())
}
