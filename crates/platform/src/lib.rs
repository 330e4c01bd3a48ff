#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Platform layer for rbt
//!
//! This crate wraps the operating-system facilities the build lifecycle needs:
//! spawning processes with log capture under a job lock, and scoped changes
//! of the process working directory. Operations report through
//! [`PlatformContext`] as platform events.

pub mod core;
pub mod lock;
pub mod process;
pub mod workdir;

pub use self::core::PlatformContext;
pub use lock::JobLock;
pub use process::{LocalSpawner, ProcessSpawner, SpawnCommand, SpawnOutcome};
pub use workdir::WorkingDirGuard;
