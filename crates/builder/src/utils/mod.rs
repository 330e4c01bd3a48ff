//! Helpers shared by the lifecycle implementations

pub mod fileops;
