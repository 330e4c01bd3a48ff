#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for rbt
//!
//! Build and repository records as seen by the build lifecycle, plus the
//! command-line shapes passed between the dispatcher and the spawner.

pub mod build;
pub mod command;
pub mod repository;

pub use build::{Build, BuildId};
pub use command::{CommandTemplate, LifecycleOp, ServerCommand};
pub use repository::{RepoId, Repository, DEFAULT_MODULE};
