//! Process spawning with log capture and a job lock

use async_trait::async_trait;
use rbt_errors::{Error, PlatformError};
use rbt_events::{AppEvent, EventEmitter, PlatformEvent};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;

use crate::core::{duration_to_millis, PlatformContext};
use crate::lock::JobLock;

/// Program and arguments of a process to spawn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnCommand {
    args: Vec<String>,
    current_dir: Option<PathBuf>,
}

impl SpawnCommand {
    /// Command from its full argument vector, program first
    ///
    /// # Errors
    ///
    /// Returns [`PlatformError::EmptyCommand`] if `args` is empty.
    pub fn from_args<I, S>(args: I) -> Result<Self, PlatformError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        if args.is_empty() {
            return Err(PlatformError::EmptyCommand);
        }
        Ok(Self {
            args,
            current_dir: None,
        })
    }

    /// Run the child somewhere other than the inherited directory
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.args[0]
    }

    #[must_use]
    pub fn get_args(&self) -> &[String] {
        &self.args[1..]
    }

    #[must_use]
    pub fn argv(&self) -> &[String] {
        &self.args
    }

    #[must_use]
    pub fn get_current_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }
}

/// Result of a finished child
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnOutcome {
    pub pid: Option<u32>,
    /// `None` when the child was killed by a signal
    pub exit_code: Option<i32>,
}

impl SpawnOutcome {
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs build commands on behalf of the lifecycle
#[async_trait]
pub trait ProcessSpawner: Send + Sync {
    /// Spawn `command` with output sent to `log_path` while holding `lock_path`,
    /// then wait for it
    async fn spawn(
        &self,
        ctx: &PlatformContext,
        command: &SpawnCommand,
        lock_path: &Path,
        log_path: &Path,
    ) -> Result<SpawnOutcome, Error>;
}

/// Spawner running children on the local host
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalSpawner;

impl LocalSpawner {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn open_log(log_path: &Path) -> Result<(Stdio, Stdio), PlatformError> {
    let fail = |e: std::io::Error| PlatformError::LogFileFailed {
        path: log_path.display().to_string(),
        message: e.to_string(),
    };

    if let Some(parent) = log_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(fail)?;
        }
    }
    let stdout = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_path)
        .map_err(fail)?;
    let stderr = stdout.try_clone().map_err(fail)?;
    Ok((Stdio::from(stdout), Stdio::from(stderr)))
}

#[async_trait]
impl ProcessSpawner for LocalSpawner {
    async fn spawn(
        &self,
        ctx: &PlatformContext,
        command: &SpawnCommand,
        lock_path: &Path,
        log_path: &Path,
    ) -> Result<SpawnOutcome, Error> {
        let start = Instant::now();
        let argv = command.argv().to_vec();

        let result: Result<SpawnOutcome, PlatformError> = async {
            let (stdout, stderr) = open_log(log_path)?;
            let lock = JobLock::acquire(lock_path)?;
            ctx.emit(AppEvent::Platform(PlatformEvent::LockAcquired {
                path: lock.path().to_path_buf(),
            }));

            let mut cmd = Command::new(command.program());
            cmd.args(command.get_args())
                .stdin(Stdio::null())
                .stdout(stdout)
                .stderr(stderr);
            if let Some(dir) = command.get_current_dir() {
                cmd.current_dir(dir);
            }

            let cwd = command
                .get_current_dir()
                .map(Path::to_path_buf)
                .or_else(|| std::env::current_dir().ok());
            ctx.emit(AppEvent::Platform(PlatformEvent::ProcessStarted {
                command: argv.clone(),
                cwd,
                log_path: log_path.to_path_buf(),
            }));

            let mut child = cmd
                .spawn()
                .map_err(|e| PlatformError::ProcessExecutionFailed {
                    command: argv.join(" "),
                    message: e.to_string(),
                })?;
            let pid = child.id();
            let status = child
                .wait()
                .await
                .map_err(|e| PlatformError::ProcessExecutionFailed {
                    command: argv.join(" "),
                    message: e.to_string(),
                })?;
            drop(lock);

            Ok(SpawnOutcome {
                pid,
                exit_code: status.code(),
            })
        }
        .await;

        let duration = start.elapsed();
        match result {
            Ok(outcome) => {
                ctx.emit(AppEvent::Platform(PlatformEvent::ProcessCompleted {
                    command: argv,
                    pid: outcome.pid,
                    exit_code: outcome.exit_code,
                    duration_ms: duration_to_millis(duration),
                }));
                Ok(outcome)
            }
            Err(e) => {
                ctx.emit_process_failed(&argv, &e, duration);
                Err(e.into())
            }
        }
    }
}
