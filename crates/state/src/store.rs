//! Build record store

use crate::queries;
use async_trait::async_trait;
use rbt_errors::{Error, StateError};
use rbt_types::{Build, BuildId, RepoId, Repository};
use sqlx::{Pool, Sqlite};
use std::collections::HashMap;

/// Access to build records used by the lifecycle operations
#[async_trait]
pub trait BuildStore: Send + Sync {
    /// Subset of `ids` whose repository has `is_custom_build` set, in input order
    async fn custom_build_ids(&self, ids: &[BuildId]) -> Result<Vec<BuildId>, Error>;

    /// Records for `ids` in input order, duplicates removed
    ///
    /// Fails with [`StateError::BuildNotFound`] on the first unknown id.
    async fn browse(&self, ids: &[BuildId]) -> Result<Vec<Build>, Error>;

    /// Fresh copy of one record
    async fn get(&self, id: BuildId) -> Result<Build, Error>;

    /// Persist `prebuilt = true`
    async fn mark_prebuilt(&self, id: BuildId) -> Result<(), Error>;
}

/// `SQLite`-backed store
#[derive(Clone)]
pub struct SqliteBuildStore {
    pool: Pool<Sqlite>,
}

impl std::fmt::Debug for SqliteBuildStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBuildStore").finish_non_exhaustive()
    }
}

impl SqliteBuildStore {
    #[must_use]
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Open the database at `db_path` and apply pending migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub async fn open(db_path: &std::path::Path) -> Result<Self, Error> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| Error::io_with_path(&e, parent))?;
            }
        }
        let pool = crate::create_pool(db_path).await?;
        crate::run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Register a repository policy
    ///
    /// # Errors
    ///
    /// Returns an error if the name is already taken or the insert fails.
    pub async fn insert_repository(&self, repo: &Repository) -> Result<RepoId, Error> {
        let mut tx = self.pool.begin().await?;
        let id = queries::insert_repository(&mut tx, repo).await?;
        tx.commit().await?;
        Ok(id)
    }

    /// Register a build of `repo`
    ///
    /// # Errors
    ///
    /// Returns an error if the repository does not exist or `dest` is taken.
    pub async fn insert_build(
        &self,
        repo: RepoId,
        name: &str,
        dest: &str,
        port: u16,
    ) -> Result<BuildId, Error> {
        let mut tx = self.pool.begin().await?;
        let id = queries::insert_build(&mut tx, repo, name, dest, port).await?;
        tx.commit().await?;
        Ok(id)
    }
}

#[async_trait]
impl BuildStore for SqliteBuildStore {
    async fn custom_build_ids(&self, ids: &[BuildId]) -> Result<Vec<BuildId>, Error> {
        let mut conn = self.pool.acquire().await?;
        queries::custom_build_ids(&mut conn, ids).await
    }

    async fn browse(&self, ids: &[BuildId]) -> Result<Vec<Build>, Error> {
        let mut conn = self.pool.acquire().await?;
        let rows = queries::fetch_build_rows(&mut conn, ids).await?;

        let mut by_id: HashMap<i64, _> = rows.into_iter().map(|r| (r.id, r)).collect();
        BuildId::unique(ids)
            .into_iter()
            .map(|id| {
                by_id
                    .remove(&id.0)
                    .ok_or_else(|| Error::from(StateError::BuildNotFound { id: id.0 }))
                    .and_then(crate::models::BuildRow::into_build)
            })
            .collect()
    }

    async fn get(&self, id: BuildId) -> Result<Build, Error> {
        let mut conn = self.pool.acquire().await?;
        queries::fetch_build_row(&mut conn, id)
            .await?
            .ok_or_else(|| Error::from(StateError::BuildNotFound { id: id.0 }))?
            .into_build()
    }

    async fn mark_prebuilt(&self, id: BuildId) -> Result<(), Error> {
        let mut tx = self.pool.begin().await?;
        queries::mark_prebuilt(&mut tx, id).await?;
        tx.commit().await?;
        Ok(())
    }
}
