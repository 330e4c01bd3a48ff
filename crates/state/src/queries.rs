//! Runtime SQL queries for build records

use crate::models::{encode_modules, encode_template, BuildRow};
use rbt_errors::{Error, StateError};
use rbt_types::{BuildId, RepoId, Repository};
use sqlx::{query, query_as, QueryBuilder, Row, Sqlite, SqliteConnection, Transaction};

const BUILD_COLUMNS: &str = "SELECT b.id, b.name, b.dest, b.port, b.prebuilt, \
     r.id AS repo_id, r.name AS repo_name, r.modules, r.is_custom_build, \
     r.custom_build_dir, r.custom_server_path, r.custom_pre_build_cmd, r.custom_server_params \
     FROM builds b JOIN repos r ON r.id = b.repo_id";

/// Ids among `ids` whose repository opts into custom builds
pub async fn custom_build_ids(
    conn: &mut SqliteConnection,
    ids: &[BuildId],
) -> Result<Vec<BuildId>, Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT b.id FROM builds b JOIN repos r ON r.id = b.repo_id \
         WHERE r.is_custom_build = 1 AND b.id IN (",
    );
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(id.0);
    }
    separated.push_unseparated(")");

    let rows = builder.build().fetch_all(&mut *conn).await?;
    let found: Vec<i64> = rows.iter().map(|r| r.get("id")).collect();

    Ok(BuildId::unique(ids)
        .into_iter()
        .filter(|id| found.contains(&id.0))
        .collect())
}

/// Rows for `ids`, unordered; missing ids are simply absent
pub async fn fetch_build_rows(
    conn: &mut SqliteConnection,
    ids: &[BuildId],
) -> Result<Vec<BuildRow>, Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(BUILD_COLUMNS);
    builder.push(" WHERE b.id IN (");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(id.0);
    }
    separated.push_unseparated(")");

    Ok(builder
        .build_query_as::<BuildRow>()
        .fetch_all(&mut *conn)
        .await?)
}

/// Single build row
pub async fn fetch_build_row(
    conn: &mut SqliteConnection,
    id: BuildId,
) -> Result<Option<BuildRow>, Error> {
    let sql = format!("{BUILD_COLUMNS} WHERE b.id = ?1");
    Ok(query_as::<_, BuildRow>(&sql)
        .bind(id.0)
        .fetch_optional(&mut *conn)
        .await?)
}

/// Set the prebuilt flag
pub async fn mark_prebuilt(tx: &mut Transaction<'_, Sqlite>, id: BuildId) -> Result<(), Error> {
    let result = query("UPDATE builds SET prebuilt = 1 WHERE id = ?1")
        .bind(id.0)
        .execute(&mut **tx)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StateError::BuildNotFound { id: id.0 }.into());
    }
    Ok(())
}

/// Insert a repository policy and return its id
pub async fn insert_repository(
    tx: &mut Transaction<'_, Sqlite>,
    repo: &Repository,
) -> Result<RepoId, Error> {
    let row = query(
        "INSERT INTO repos (name, modules, is_custom_build, custom_build_dir, \
         custom_server_path, custom_pre_build_cmd, custom_server_params) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) RETURNING id",
    )
    .bind(&repo.name)
    .bind(encode_modules(repo.modules.as_deref()))
    .bind(repo.is_custom_build)
    .bind(repo.custom_build_dir.as_deref())
    .bind(repo.custom_server_path.as_deref())
    .bind(encode_template(repo.custom_pre_build_cmd.as_ref())?)
    .bind(encode_template(repo.custom_server_params.as_ref())?)
    .fetch_one(&mut **tx)
    .await?;

    Ok(RepoId(row.get("id")))
}

/// Insert a build record and return its id
pub async fn insert_build(
    tx: &mut Transaction<'_, Sqlite>,
    repo: RepoId,
    name: &str,
    dest: &str,
    port: u16,
) -> Result<BuildId, Error> {
    let exists = query("SELECT id FROM repos WHERE id = ?1")
        .bind(repo.0)
        .fetch_optional(&mut **tx)
        .await?;
    if exists.is_none() {
        return Err(StateError::RepositoryNotFound {
            name: repo.to_string(),
        }
        .into());
    }

    let row = query(
        "INSERT INTO builds (repo_id, name, dest, port) VALUES (?1, ?2, ?3, ?4) RETURNING id",
    )
    .bind(repo.0)
    .bind(name)
    .bind(dest)
    .bind(i64::from(port))
    .fetch_one(&mut **tx)
    .await?;

    Ok(BuildId(row.get("id")))
}
