//! Core module containing the lifecycle context

pub mod context;
