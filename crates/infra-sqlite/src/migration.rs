// Versioned schema migrations

use crate::error::map_sqlx_error;
use catalog_sync_core::error::Result;
use sqlx::SqlitePool;
use tracing::{debug, info};

struct Migration {
    version: i64,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "sync state, failure log and job runs",
    sql: include_str!("../migrations/001_initial_schema.sql"),
}];

/// Apply pending migrations; returns the resulting schema version
pub async fn run_migrations(pool: &SqlitePool) -> Result<i64> {
    let mut version = current_version(pool).await?;
    debug!(version = version, "Schema version before migrations");

    let start = version;
    for migration in MIGRATIONS.iter().filter(|m| m.version > start) {
        info!(
            version = migration.version,
            description = migration.description,
            "Applying migration"
        );
        apply(pool, migration).await?;
        version = migration.version;
    }

    Ok(version)
}

/// Current schema version (0 on an empty database)
pub async fn current_version(pool: &SqlitePool) -> Result<i64> {
    let has_table: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version')",
    )
    .fetch_one(pool)
    .await
    .map_err(map_sqlx_error)?;

    if !has_table {
        return Ok(0);
    }

    let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(pool)
        .await
        .map_err(map_sqlx_error)?;
    Ok(version.unwrap_or(0))
}

/// Run one migration file and record it, all in one transaction
async fn apply(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    let mut tx = pool.begin().await.map_err(map_sqlx_error)?;

    for statement in statements(migration.sql) {
        sqlx::query(&statement)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
    }

    sqlx::query("INSERT INTO schema_version (version, description, applied_at) VALUES (?, ?, ?)")
        .bind(migration.version)
        .bind(migration.description)
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

    tx.commit().await.map_err(map_sqlx_error)
}

/// Split a file into statements, dropping `--` comment lines
fn statements(sql: &str) -> Vec<String> {
    sql.split(';')
        .map(|chunk| {
            chunk
                .lines()
                .filter(|line| !line.trim_start().starts_with("--"))
                .collect::<Vec<_>>()
                .join("\n")
                .trim()
                .to_string()
        })
        .filter(|statement| !statement.is_empty())
        .collect()
}
