// SQLite JobRepository Implementation

use crate::error::map_sqlx_error;
use async_trait::async_trait;
use catalog_sync_core::domain::{JobPayload, JobRun, JobRunId, JobState};
use catalog_sync_core::error::{AppError, Result};
use catalog_sync_core::port::JobRepository;
use sqlx::SqlitePool;
use tracing::warn;

pub struct SqliteJobRepository {
    pool: SqlitePool,
}

impl SqliteJobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobRepository for SqliteJobRepository {
    async fn insert(&self, run: &JobRun) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO job_runs (
                id, name, payload, batch_number, state,
                created_at, started_at, finished_at, items_processed, error
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&run.id)
        .bind(&run.name)
        .bind(run.payload.as_value().to_string())
        .bind(run.batch_number as i64)
        .bind(run.state.to_string())
        .bind(run.created_at)
        .bind(run.started_at)
        .bind(run.finished_at)
        .bind(run.items_processed as i64)
        .bind(&run.error)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: &JobRunId) -> Result<Option<JobRun>> {
        let row = sqlx::query_as::<_, JobRunRow>("SELECT * FROM job_runs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(JobRunRow::into_run).transpose()
    }

    async fn update(&self, run: &JobRun) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE job_runs
            SET batch_number = ?, state = ?, started_at = ?, finished_at = ?,
                items_processed = ?, error = ?
            WHERE id = ?
            "#,
        )
        .bind(run.batch_number as i64)
        .bind(run.state.to_string())
        .bind(run.started_at)
        .bind(run.finished_at)
        .bind(run.items_processed as i64)
        .bind(&run.error)
        .bind(&run.id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("job run {}", run.id)));
        }
        Ok(())
    }

    async fn find_by_state(&self, state: JobState) -> Result<Vec<JobRun>> {
        let rows: Vec<JobRunRow> = sqlx::query_as(
            r#"
            SELECT * FROM job_runs
            WHERE state = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(state.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(JobRunRow::into_run).collect()
    }

    async fn count_by_state(&self, name: &str, state: JobState) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM job_runs WHERE name = ? AND state = ?")
                .bind(name)
                .bind(state.to_string())
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(count)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<JobRun>> {
        let rows: Vec<JobRunRow> =
            sqlx::query_as("SELECT * FROM job_runs ORDER BY created_at DESC, rowid DESC LIMIT ?")
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        rows.into_iter().map(JobRunRow::into_run).collect()
    }
}

/// SQLite row representation
#[derive(Debug, sqlx::FromRow)]
struct JobRunRow {
    id: String,
    name: String,
    payload: String,
    batch_number: i64,
    state: String,
    created_at: i64,
    started_at: Option<i64>,
    finished_at: Option<i64>,
    items_processed: i64,
    error: Option<String>,
}

impl JobRunRow {
    fn into_run(self) -> Result<JobRun> {
        let state: JobState = self
            .state
            .parse()
            .map_err(|e| AppError::Storage(format!("job run {}: {}", self.id, e)))?;

        let payload: serde_json::Value = serde_json::from_str(&self.payload).unwrap_or_else(|e| {
            warn!(job_id = %self.id, error = %e, "Unreadable job payload, using empty payload");
            serde_json::json!({})
        });

        Ok(JobRun {
            id: self.id,
            name: self.name,
            payload: JobPayload::new(payload),
            batch_number: self.batch_number.max(1) as u32,
            state,
            created_at: self.created_at,
            started_at: self.started_at,
            finished_at: self.finished_at,
            items_processed: self.items_processed.max(0) as u64,
            error: self.error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};

    async fn setup_repo() -> SqliteJobRepository {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteJobRepository::new(pool)
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let repo = setup_repo().await;
        let run = JobRun::new(
            "run-1",
            "update_products",
            JobPayload::product_ids(&[55, 56]),
            1_000,
        );

        repo.insert(&run).await.unwrap();

        let found = repo.find_by_id(&run.id).await.unwrap().unwrap();
        assert_eq!(found, run);
        assert_eq!(found.payload.read_product_ids().unwrap(), vec![55, 56]);
        assert!(repo.find_by_id(&"missing".to_string()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_rejected() {
        let repo = setup_repo().await;
        let run = JobRun::new("run-1", "delete_all_products", JobPayload::empty(), 0);
        repo.insert(&run).await.unwrap();

        let err = repo.insert(&run).await.unwrap_err();
        assert!(err.to_string().contains("Unique constraint violation"));
    }

    #[tokio::test]
    async fn test_update_and_query_by_state() {
        let repo = setup_repo().await;
        let mut first = JobRun::new("a", "delete_all_products", JobPayload::empty(), 1);
        let second = JobRun::new("b", "delete_all_products", JobPayload::empty(), 2);
        repo.insert(&first).await.unwrap();
        repo.insert(&second).await.unwrap();

        first.start(10).unwrap();
        first.advance(1, 100).unwrap();
        repo.update(&first).await.unwrap();

        let running = repo.find_by_state(JobState::Running).await.unwrap();
        assert_eq!(running, vec![first.clone()]);
        assert_eq!(running[0].batch_number, 2);
        assert_eq!(
            repo.count_by_state("delete_all_products", JobState::Scheduled)
                .await
                .unwrap(),
            1
        );

        let recent = repo.recent(10).await.unwrap();
        let ids: Vec<&str> = recent.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_update_missing_run() {
        let repo = setup_repo().await;
        let run = JobRun::new("ghost", "x", JobPayload::empty(), 0);

        let err = repo.update(&run).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
