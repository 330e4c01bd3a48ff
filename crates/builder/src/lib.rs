#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]
//! Build lifecycle for rbt
//!
//! This crate checks builds out, runs their pre-build commands and
//! constructs server launch commands. Repositories flagged as custom builds
//! get their own checkout directory, pre-build command and server entrypoint;
//! mixed batches are split by [`dispatch`](dispatch::dispatch).

mod core;
pub mod dispatch;
mod job;
mod lifecycle;
pub mod source;
pub mod template;
mod utils;

pub use self::core::context::LifecycleContext;
pub use dispatch::Partition;
pub use job::{run_prebuild_job, PREBUILD_STEP};
pub use lifecycle::{BuildLifecycle, CustomBuildLifecycle, DefaultLifecycle};
pub use source::{GitExporter, SourceExporter};
