// SQLite SyncStateStore Implementation

use crate::error::{from_db_id, map_sqlx_error, to_db_id};
use async_trait::async_trait;
use catalog_sync_core::domain::{ProductId, ProductRef, SyncState, SyncStatus};
use catalog_sync_core::error::{AppError, Result};
use catalog_sync_core::port::SyncStateStore;
use sqlx::SqlitePool;

// Stay well below SQLite's bound-parameter limit
const MAX_IDS_PER_QUERY: usize = 500;

pub struct SqliteSyncStateRepository {
    pool: SqlitePool,
}

impl SqliteSyncStateRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SyncStateStore for SqliteSyncStateRepository {
    async fn get(&self, id: ProductId) -> Result<Option<SyncState>> {
        let row = sqlx::query_as::<_, SyncStateRow>(
            "SELECT * FROM product_sync_state WHERE product_id = ?",
        )
        .bind(to_db_id(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(SyncStateRow::into_state).transpose()
    }

    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<SyncState>> {
        let mut states = Vec::with_capacity(ids.len());

        for chunk in ids.chunks(MAX_IDS_PER_QUERY) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT * FROM product_sync_state WHERE product_id IN ({})",
                placeholders
            );

            let mut query = sqlx::query_as::<_, SyncStateRow>(&sql);
            for id in chunk {
                query = query.bind(to_db_id(*id));
            }
            let rows = query.fetch_all(&self.pool).await.map_err(map_sqlx_error)?;

            for row in rows {
                states.push(row.into_state()?);
            }
        }

        Ok(states)
    }

    async fn put(&self, state: &SyncState) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO product_sync_state (
                product_id, parent_id, version, status, remote_id,
                synced_version, synced_at, last_error, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(product_id) DO UPDATE SET
                parent_id = excluded.parent_id,
                version = excluded.version,
                status = excluded.status,
                remote_id = excluded.remote_id,
                synced_version = excluded.synced_version,
                synced_at = excluded.synced_at,
                last_error = excluded.last_error,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(to_db_id(state.product.id))
        .bind(state.product.parent_id.map(to_db_id))
        .bind(&state.product.version)
        .bind(state.status.to_string())
        .bind(&state.remote_id)
        .bind(&state.synced_version)
        .bind(state.synced_at)
        .bind(&state.last_error)
        .bind(state.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn tracked_ids(&self, limit: usize, offset: usize) -> Result<Vec<ProductId>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT product_id FROM product_sync_state ORDER BY product_id ASC LIMIT ? OFFSET ?",
        )
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(ids.into_iter().map(from_db_id).collect())
    }

    async fn find_by_status(&self, status: SyncStatus, limit: usize) -> Result<Vec<SyncState>> {
        let rows: Vec<SyncStateRow> = sqlx::query_as(
            r#"
            SELECT * FROM product_sync_state
            WHERE status = ?
            ORDER BY updated_at DESC, product_id ASC
            LIMIT ?
            "#,
        )
        .bind(status.to_string())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(SyncStateRow::into_state).collect()
    }

    async fn count_by_status(&self, status: SyncStatus) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM product_sync_state WHERE status = ?")
                .bind(status.to_string())
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx_error)?;

        Ok(count)
    }
}

/// SQLite row representation
#[derive(Debug, sqlx::FromRow)]
struct SyncStateRow {
    product_id: i64,
    parent_id: Option<i64>,
    version: String,
    status: String,
    remote_id: Option<String>,
    synced_version: Option<String>,
    synced_at: Option<i64>,
    last_error: Option<String>,
    updated_at: i64,
}

impl SyncStateRow {
    fn into_state(self) -> Result<SyncState> {
        let status: SyncStatus = self.status.parse().map_err(|e| {
            AppError::Storage(format!("product {}: {}", self.product_id, e))
        })?;

        let state = SyncState {
            product: ProductRef {
                id: from_db_id(self.product_id),
                parent_id: self.parent_id.map(from_db_id),
                version: self.version,
            },
            status,
            remote_id: self.remote_id,
            synced_version: self.synced_version,
            synced_at: self.synced_at,
            last_error: self.last_error,
            updated_at: self.updated_at,
        };
        state.validate()?;
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};
    use catalog_sync_core::domain::{ErrorCode, ErrorRecord, SyncedItem};

    async fn setup_repo() -> SqliteSyncStateRepository {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteSyncStateRepository::new(pool)
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let repo = setup_repo().await;
        let product = ProductRef::variation(12, 10, "v3");

        repo.put(&SyncState::synced(&SyncedItem::new(product.clone(), "remote-12"), 100))
            .await
            .unwrap();
        let previous = repo.get(12).await.unwrap();
        let invalid = SyncState::invalid(
            &ErrorRecord::new(product.clone(), ErrorCode::InternalError, "timeout"),
            previous.as_ref(),
            200,
        );
        repo.put(&invalid).await.unwrap();

        let found = repo.get(12).await.unwrap().unwrap();
        assert_eq!(found, invalid);
        assert_eq!(found.product.parent_id, Some(10));
        assert_eq!(found.remote_id.as_deref(), Some("remote-12"));
        assert_eq!(repo.count_by_status(SyncStatus::Synced).await.unwrap(), 0);
        assert_eq!(repo.count_by_status(SyncStatus::Invalid).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_get_many_and_tracked_ids() {
        let repo = setup_repo().await;
        for id in [5u64, 1, 3] {
            repo.put(&SyncState::unsynced(ProductRef::new(id, "v1"), 0))
                .await
                .unwrap();
        }

        let found = repo.get_many(&[1, 2, 3]).await.unwrap();
        let mut ids: Vec<ProductId> = found.iter().map(|s| s.id()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 3]);
        assert!(repo.get_many(&[]).await.unwrap().is_empty());

        assert_eq!(repo.tracked_ids(2, 0).await.unwrap(), vec![1, 3]);
        assert_eq!(repo.tracked_ids(2, 2).await.unwrap(), vec![5]);
        assert!(repo.tracked_ids(2, 4).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_many_beyond_parameter_limit() {
        let repo = setup_repo().await;
        let ids: Vec<ProductId> = (1..=1200).collect();
        for id in &ids {
            repo.put(&SyncState::unsynced(ProductRef::new(*id, "v1"), 0))
                .await
                .unwrap();
        }

        assert_eq!(repo.get_many(&ids).await.unwrap().len(), 1200);
    }

    #[tokio::test]
    async fn test_find_by_status_newest_first() {
        let repo = setup_repo().await;
        for (id, at) in [(1u64, 10), (2, 30), (3, 20)] {
            repo.put(&SyncState::invalid(
                &ErrorRecord::invalid_payload(ProductRef::new(id, "v1"), "missing title"),
                None,
                at,
            ))
            .await
            .unwrap();
        }

        let found = repo.find_by_status(SyncStatus::Invalid, 2).await.unwrap();
        let ids: Vec<ProductId> = found.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(
            found[0].last_error.as_deref(),
            Some("[invalid_payload] missing title")
        );
    }

    #[tokio::test]
    async fn test_corrupt_row_is_storage_error() {
        let repo = setup_repo().await;
        sqlx::query(
            "INSERT INTO product_sync_state (product_id, version, status, updated_at) VALUES (1, 'v1', 'SYNCED', 0)",
        )
        .execute(&repo.pool)
        .await
        .unwrap();

        let err = repo.get(1).await.unwrap_err();
        assert!(err.to_string().contains("without a remote id"));
    }
}
