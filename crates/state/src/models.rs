//! Database models for builds and repositories

use rbt_errors::{Error, StateError};
use rbt_types::{Build, BuildId, CommandTemplate, RepoId, Repository};
use sqlx::FromRow;

/// A repository policy record
#[derive(Debug, Clone, FromRow)]
pub struct RepositoryRow {
    pub id: i64,
    pub name: String,
    pub modules: Option<String>,
    pub is_custom_build: bool,
    pub custom_build_dir: Option<String>,
    pub custom_server_path: Option<String>,
    pub custom_pre_build_cmd: Option<String>,
    pub custom_server_params: Option<String>,
}

/// A build record joined with its repository
#[derive(Debug, Clone, FromRow)]
pub struct BuildRow {
    pub id: i64,
    pub name: String,
    pub dest: String,
    pub port: i64,
    pub prebuilt: bool,
    pub repo_id: i64,
    pub repo_name: String,
    pub modules: Option<String>,
    pub is_custom_build: bool,
    pub custom_build_dir: Option<String>,
    pub custom_server_path: Option<String>,
    pub custom_pre_build_cmd: Option<String>,
    pub custom_server_params: Option<String>,
}

impl RepositoryRow {
    /// Convert into the domain record
    ///
    /// # Errors
    ///
    /// Returns an error if a stored command template is malformed.
    pub fn into_repository(self) -> Result<Repository, Error> {
        let id = self.id;
        Ok(Repository {
            id: RepoId(id),
            name: self.name,
            modules: self.modules.as_deref().and_then(decode_modules),
            is_custom_build: self.is_custom_build,
            custom_build_dir: self.custom_build_dir,
            custom_server_path: self.custom_server_path,
            custom_pre_build_cmd: decode_template(self.custom_pre_build_cmd, "repos", id)?,
            custom_server_params: decode_template(self.custom_server_params, "repos", id)?,
        })
    }
}

impl BuildRow {
    /// Convert into the domain record
    ///
    /// # Errors
    ///
    /// Returns an error if the port is out of range or a template is malformed.
    pub fn into_build(self) -> Result<Build, Error> {
        let port = u16::try_from(self.port).map_err(|_| StateError::InvalidRecord {
            table: "builds".to_string(),
            id: self.id,
            message: format!("port {} out of range", self.port),
        })?;

        let repo = RepositoryRow {
            id: self.repo_id,
            name: self.repo_name,
            modules: self.modules,
            is_custom_build: self.is_custom_build,
            custom_build_dir: self.custom_build_dir,
            custom_server_path: self.custom_server_path,
            custom_pre_build_cmd: self.custom_pre_build_cmd,
            custom_server_params: self.custom_server_params,
        }
        .into_repository()?;

        Ok(Build {
            id: BuildId(self.id),
            name: self.name,
            dest: self.dest,
            port,
            prebuilt: self.prebuilt,
            repo,
        })
    }
}

/// Comma-separated module list; blank lists read as unset
fn decode_modules(raw: &str) -> Option<Vec<String>> {
    let modules: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(ToString::to_string)
        .collect();
    (!modules.is_empty()).then_some(modules)
}

#[must_use]
pub fn encode_modules(modules: Option<&[String]>) -> Option<String> {
    modules.map(|m| m.join(","))
}

/// Plain text is a single command line, `[...]` is a JSON token list
fn decode_template(
    raw: Option<String>,
    table: &str,
    id: i64,
) -> Result<Option<CommandTemplate>, Error> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    if raw.trim_start().starts_with('[') {
        let tokens: Vec<String> =
            serde_json::from_str(&raw).map_err(|e| StateError::InvalidRecord {
                table: table.to_string(),
                id,
                message: format!("command template is not a JSON string array: {e}"),
            })?;
        Ok(Some(CommandTemplate::Tokens(tokens)))
    } else {
        Ok(Some(CommandTemplate::Line(raw)))
    }
}

/// Storage form of a template, the inverse of the decoding above
///
/// # Errors
///
/// Returns an error if the token list cannot be serialized.
pub fn encode_template(template: Option<&CommandTemplate>) -> Result<Option<String>, Error> {
    match template {
        None => Ok(None),
        Some(CommandTemplate::Line(line)) => Ok(Some(line.clone())),
        Some(CommandTemplate::Tokens(tokens)) => Ok(Some(serde_json::to_string(tokens)?)),
    }
}
