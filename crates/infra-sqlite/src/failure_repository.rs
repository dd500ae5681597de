// SQLite FailureStore Implementation

use crate::error::{from_db_id, map_sqlx_error, to_db_id};
use async_trait::async_trait;
use catalog_sync_core::domain::{FailureRecord, ProductId};
use catalog_sync_core::error::Result;
use catalog_sync_core::port::FailureStore;
use sqlx::SqlitePool;

pub struct SqliteFailureRepository {
    pool: SqlitePool,
}

impl SqliteFailureRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FailureStore for SqliteFailureRepository {
    async fn record(&self, record: FailureRecord) -> Result<()> {
        sqlx::query("INSERT INTO sync_failures (product_id, failed_at) VALUES (?, ?)")
            .bind(to_db_id(record.product_id))
            .bind(record.failed_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn list_since(&self, product_id: ProductId, since: i64) -> Result<Vec<FailureRecord>> {
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            r#"
            SELECT product_id, failed_at FROM sync_failures
            WHERE product_id = ? AND failed_at >= ?
            ORDER BY failed_at ASC
            "#,
        )
        .bind(to_db_id(product_id))
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|(id, failed_at)| FailureRecord::new(from_db_id(id), failed_at))
            .collect())
    }

    async fn prune_before(&self, product_id: ProductId, before: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sync_failures WHERE product_id = ? AND failed_at < ?")
            .bind(to_db_id(product_id))
            .bind(before)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }

    async fn clear(&self, product_id: ProductId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sync_failures WHERE product_id = ?")
            .bind(to_db_id(product_id))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        Ok(result.rows_affected())
    }
}
