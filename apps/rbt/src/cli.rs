//! Command line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// rbt - custom-build lifecycle driver for the CI build runner
#[derive(Parser)]
#[command(name = "rbt")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Custom-build lifecycle driver for the CI build runner")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Enable debug logging to the runner log directory
    #[arg(long, global = true)]
    pub debug: bool,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Use alternate record database
    #[arg(long, global = true, value_name = "PATH")]
    pub database: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Create or upgrade the record database
    Migrate,

    /// Check out builds into fresh directories
    Checkout {
        /// Build ids
        #[arg(required = true)]
        ids: Vec<i64>,
    },

    /// Run the pre-build job (checkout, pre-build commands, mark prebuilt)
    Prebuild {
        /// Build ids
        #[arg(required = true)]
        ids: Vec<i64>,

        /// Lock file held while commands run [default: <build>/logs/job_00_prebuild.lock]
        #[arg(long, value_name = "PATH")]
        lock_path: Option<PathBuf>,

        /// File receiving command output [default: <build>/logs/job_00_prebuild.txt]
        #[arg(long, value_name = "PATH")]
        log_path: Option<PathBuf>,
    },

    /// Print the server launch command of a build
    Command {
        /// Build id
        id: i64,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    /// Operation name reported in events
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Migrate => "migrate",
            Commands::Checkout { .. } => "checkout",
            Commands::Prebuild { .. } => "prebuild",
            Commands::Command { .. } => "command",
        }
    }
}
