//! Routing of build batches between the default and custom lifecycles
//!
//! A batch may mix builds of regular and custom repositories. The dispatcher
//! asks the store which builds are custom on every call, hands the rest to
//! the default strategy first and the custom subset to the custom strategy
//! second, so no build is processed twice.

use crate::core::context::LifecycleContext;
use rbt_errors::Error;
use rbt_events::{AppEvent, BuildEvent, EventEmitter};
use rbt_types::{BuildId, LifecycleOp};
use std::future::Future;

/// A batch split by repository policy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    /// Builds of regular repositories, input order, no duplicates
    pub regular: Vec<BuildId>,
    /// Builds of custom repositories, input order, no duplicates
    pub custom: Vec<BuildId>,
}

impl Partition {
    /// Split `ids` given the members known to be custom
    #[must_use]
    pub fn split(ids: &[BuildId], custom_ids: &[BuildId]) -> Self {
        let (custom, regular): (Vec<BuildId>, Vec<BuildId>) = BuildId::unique(ids)
            .into_iter()
            .partition(|id| custom_ids.contains(id));
        Self { regular, custom }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regular.is_empty() && self.custom.is_empty()
    }
}

/// Run `default` on the regular subset of `ids`, then `custom` on the custom subset
///
/// Strategies are skipped for empty subsets. The result is the custom
/// strategy's when it ran, otherwise the default strategy's.
///
/// # Errors
///
/// Propagates failures of the custom-id query and of either strategy.
///
/// # Panics
///
/// Panics if the default strategy returned a value and custom builds remain
/// to be processed, since the custom result would silently replace it.
pub async fn dispatch<T, D, DF, C, CF>(
    ctx: &LifecycleContext,
    op: LifecycleOp,
    ids: &[BuildId],
    default: D,
    custom: C,
) -> Result<Option<T>, Error>
where
    D: FnOnce(Vec<BuildId>) -> DF,
    DF: Future<Output = Result<Option<T>, Error>>,
    C: FnOnce(Vec<BuildId>) -> CF,
    CF: Future<Output = Result<Option<T>, Error>>,
{
    let custom_ids = ctx.store().custom_build_ids(ids).await?;
    let partition = Partition::split(ids, &custom_ids);

    ctx.emit(AppEvent::Build(BuildEvent::Dispatched {
        operation: op,
        regular: partition.regular.clone(),
        custom: partition.custom.clone(),
    }));

    let mut result = None;
    if !partition.regular.is_empty() {
        result = default(partition.regular).await?;
    }
    if !partition.custom.is_empty() {
        assert!(
            result.is_none(),
            "{op}: default lifecycle returned a value for a batch that also holds custom builds"
        );
        result = custom(partition.custom).await?;
    }
    Ok(result)
}
