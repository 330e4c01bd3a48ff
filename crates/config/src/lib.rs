#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for rbt
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/rbt/config.toml)
//! - Environment variables
//! - CLI flags (applied by the binary)

use rbt_errors::{ConfigError, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub runner: RunnerConfig,

    #[serde(default)]
    pub paths: PathConfig,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeneralConfig {
    /// Directory for debug log files written by the CLI
    pub log_dir: Option<PathBuf>,
}

/// Settings of the CI runner hosting the builds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Runner root; builds live in `<root>/build`, clones in `<root>/repo`
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Interpreter used to launch server entrypoints
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
    /// Database user of the runner itself, handed to launched servers
    #[serde(default = "default_db_user")]
    pub db_user: String,
    /// Entrypoints probed, in order, for non-custom builds
    #[serde(default = "default_server_candidates")]
    pub server_candidates: Vec<String>,
}

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathConfig {
    pub database: Option<PathBuf>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            interpreter: default_interpreter(),
            db_user: default_db_user(),
            server_candidates: default_server_candidates(),
        }
    }
}

// Default value functions for serde
fn default_root() -> PathBuf {
    PathBuf::from("/srv/rbt")
}

fn default_interpreter() -> String {
    "python3".to_string()
}

fn default_db_user() -> String {
    "odoo".to_string()
}

fn default_server_candidates() -> Vec<String> {
    vec![
        "odoo-bin".to_string(),
        "odoo.py".to_string(),
        "openerp-server".to_string(),
    ]
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("rbt").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            tracing::debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // RBT_ROOT
        if let Ok(root) = std::env::var("RBT_ROOT") {
            if root.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "RBT_ROOT".to_string(),
                    value: root,
                }
                .into());
            }
            self.runner.root = PathBuf::from(root);
        }

        // RBT_INTERPRETER
        if let Ok(interpreter) = std::env::var("RBT_INTERPRETER") {
            if interpreter.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "RBT_INTERPRETER".to_string(),
                    value: interpreter,
                }
                .into());
            }
            self.runner.interpreter = interpreter;
        }

        // RBT_DB_USER
        if let Ok(db_user) = std::env::var("RBT_DB_USER") {
            if db_user.trim().is_empty() || db_user.contains(char::is_whitespace) {
                return Err(ConfigError::InvalidValue {
                    field: "RBT_DB_USER".to_string(),
                    value: db_user,
                }
                .into());
            }
            self.runner.db_user = db_user;
        }

        // RBT_DATABASE
        if let Ok(database) = std::env::var("RBT_DATABASE") {
            self.paths.database = Some(PathBuf::from(database));
        }

        Ok(())
    }

    /// Check values that serde defaults cannot guard
    ///
    /// # Errors
    ///
    /// Returns an error if a required runner setting is empty.
    pub fn validate(&self) -> Result<(), Error> {
        if self.runner.db_user.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "runner.db_user".to_string(),
            }
            .into());
        }
        if self.runner.interpreter.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "runner.interpreter".to_string(),
            }
            .into());
        }
        if self.runner.server_candidates.is_empty() {
            return Err(ConfigError::MissingField {
                field: "runner.server_candidates".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Make the runner root and configured paths absolute
    ///
    /// Relative values are taken against the current directory. Call this
    /// once every override has been applied.
    ///
    /// # Errors
    ///
    /// Returns an error if a path is empty or the current directory cannot
    /// be read.
    pub fn resolve_paths(&mut self) -> Result<(), Error> {
        self.runner.root = absolute("runner.root", &self.runner.root)?;
        if let Some(database) = &self.paths.database {
            self.paths.database = Some(absolute("paths.database", database)?);
        }
        if let Some(log_dir) = &self.general.log_dir {
            self.general.log_dir = Some(absolute("general.log_dir", log_dir)?);
        }
        Ok(())
    }

    /// Get the database path (with default)
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.paths
            .database
            .clone()
            .unwrap_or_else(|| self.runner.root.join("rbt.sqlite"))
    }

    /// Get the log directory (with default)
    #[must_use]
    pub fn log_dir(&self) -> PathBuf {
        self.general
            .log_dir
            .clone()
            .unwrap_or_else(|| self.runner.root.join("logs"))
    }
}

fn absolute(field: &str, path: &Path) -> Result<PathBuf, Error> {
    std::path::absolute(path).map_err(|_| {
        ConfigError::InvalidValue {
            field: field.to_string(),
            value: path.display().to_string(),
        }
        .into()
    })
}
