//! rbt - custom-build lifecycle driver for a CI build runner
//!
//! The CLI wires configuration, the record store and the build lifecycle
//! together and renders lifecycle events through tracing.

mod cli;
mod error;
mod events;
mod logging;

use crate::cli::{Cli, Commands, GlobalArgs};
use crate::error::CliError;
use crate::events::EventHandler;
use clap::Parser;
use rbt_builder::{run_prebuild_job, BuildLifecycle, CustomBuildLifecycle, LifecycleContext};
use rbt_config::Config;
use rbt_events::{EventEmitter, EventReceiver};
use rbt_state::{BuildStore, SqliteBuildStore};
use rbt_types::BuildId;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tokio::select;
use tracing::{error, info};

/// Job name used for default lock and log file names
const PREBUILD_JOB: &str = "job_00_prebuild";

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error!("Application error: {}", e);
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    // 1. Start with file config (or defaults)
    let mut config = Config::load_or_default(cli.global.config.as_deref())
        .await
        .map_err(CliError::Config)?;

    // 2. Merge environment variables
    config.merge_env().map_err(CliError::Config)?;

    // 3. Apply CLI flags (highest precedence)
    apply_cli_config(&mut config, &cli.global);
    config.resolve_paths().map_err(CliError::Config)?;

    init_tracing(cli.global.debug, &config.log_dir());
    info!("Starting rbt v{}", env!("CARGO_PKG_VERSION"));

    let database = config.database_path();
    let store = SqliteBuildStore::open(&database).await?;
    if matches!(cli.command, Commands::Migrate) {
        println!("database ready at {}", database.display());
        return Ok(());
    }

    let (event_sender, event_receiver) = rbt_events::channel();
    let ctx = LifecycleContext::new(Arc::new(store), config.runner.clone())
        .with_event_sender(event_sender);

    let mut event_handler = EventHandler::new(cli.global.debug);
    let output =
        execute_command_with_events(cli.command, ctx, event_receiver, &mut event_handler).await?;

    if let Some(output) = output {
        println!("{output}");
    }

    info!("Command completed successfully");
    Ok(())
}

/// Apply CLI configuration overrides
fn apply_cli_config(config: &mut Config, global: &GlobalArgs) {
    if let Some(database) = &global.database {
        config.paths.database = Some(database.clone());
    }
}

/// Execute command with concurrent event handling
async fn execute_command_with_events(
    command: Commands,
    ctx: LifecycleContext,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<Option<String>, CliError> {
    let mut command_future = Box::pin(execute_command(command, ctx));

    loop {
        select! {
            result = &mut command_future => {
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(event);
                }
                return result;
            }

            event = event_receiver.recv() => {
                if let Some(event) = event {
                    event_handler.handle_event(event);
                }
            }
        }
    }
}

/// Execute the specified command, reporting it as an operation
async fn execute_command(
    command: Commands,
    ctx: LifecycleContext,
) -> Result<Option<String>, CliError> {
    let operation = command.name();
    ctx.emit_operation_started(operation);

    let result = run_command(command, &ctx).await;
    match &result {
        Ok(_) => ctx.emit_operation_completed(operation, true),
        Err(e) => ctx.emit_operation_failed(operation, e.to_string()),
    }
    result
}

/// Run the specified command, returning what to print on stdout
async fn run_command(
    command: Commands,
    ctx: &LifecycleContext,
) -> Result<Option<String>, CliError> {
    let lifecycle: CustomBuildLifecycle = CustomBuildLifecycle::default();

    match command {
        Commands::Migrate => Ok(None),

        Commands::Checkout { ids } => {
            let ids = to_build_ids(&ids);
            lifecycle.checkout(ctx, &ids).await?;
            Ok(Some(format!("checked out {} build(s)", BuildId::unique(&ids).len())))
        }

        Commands::Prebuild {
            ids,
            lock_path,
            log_path,
        } => {
            let ids = BuildId::unique(&to_build_ids(&ids));
            for id in &ids {
                let logs = ctx.store().get(*id).await?.subpath(ctx.root(), "logs");
                let lock = job_file(lock_path.as_deref(), &logs, "lock")?;
                let log = job_file(log_path.as_deref(), &logs, "txt")?;
                run_prebuild_job(&lifecycle, ctx, *id, &lock, &log).await?;
            }
            Ok(Some(format!("prebuilt {} build(s)", ids.len())))
        }

        Commands::Command { id, json } => {
            let command = lifecycle.build_command(ctx, &[BuildId(id)]).await?;
            if json {
                Ok(Some(serde_json::to_string_pretty(&command)?))
            } else {
                Ok(Some(format!(
                    "{command}\nmodules: {}",
                    command.modules_arg()
                )))
            }
        }
    }
}

fn to_build_ids(ids: &[i64]) -> Vec<BuildId> {
    ids.iter().copied().map(BuildId).collect()
}

fn job_file(explicit: Option<&Path>, logs: &Path, extension: &str) -> std::io::Result<PathBuf> {
    match explicit {
        Some(path) => std::path::absolute(path),
        None => Ok(logs.join(format!("{PREBUILD_JOB}.{extension}"))),
    }
}

/// Initialize tracing/logging
fn init_tracing(debug_enabled_flag: bool, log_dir: &Path) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_enabled_flag;

    if debug_enabled {
        // Debug mode: structured JSON logs to file
        if let Err(e) = std::fs::create_dir_all(log_dir) {
            eprintln!("Warning: Failed to create log directory: {e}");
        }

        let log_file = log_dir.join(format!(
            "rbt-{}.log",
            chrono::Utc::now().format("%Y%m%d-%H%M%S")
        ));

        match std::fs::File::create(&log_file) {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(file)
                    .with_env_filter(
                        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(
                            |_| tracing_subscriber::EnvFilter::new("info,rbt=debug,rbt::events=debug"),
                        ),
                    )
                    .init();

                eprintln!("Debug logging enabled: {}", log_file.display());
            }
            Err(e) => {
                eprintln!("Warning: Failed to create log file: {e}");
                tracing_subscriber::fmt()
                    .with_writer(std::io::stderr)
                    .with_env_filter(
                        tracing_subscriber::EnvFilter::try_from_default_env()
                            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
                    )
                    .init();
            }
        }
    } else {
        // Normal mode: the event handler echoes events itself
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter("warn,rbt::events=off")
            .init();
    }
}
