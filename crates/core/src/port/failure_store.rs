// Failure Store Port (Interface)

use crate::domain::{FailureRecord, ProductId};
use crate::error::Result;
use async_trait::async_trait;

/// Persistence for failure records (one row per failure)
#[async_trait]
pub trait FailureStore: Send + Sync {
    /// Append one failure
    async fn record(&self, record: FailureRecord) -> Result<()>;

    /// Failures of `product_id` at or after `since` (epoch ms)
    async fn list_since(&self, product_id: ProductId, since: i64) -> Result<Vec<FailureRecord>>;

    /// Delete failures of `product_id` older than `before`; returns rows removed
    async fn prune_before(&self, product_id: ProductId, before: i64) -> Result<u64>;

    /// Delete every failure of `product_id`
    async fn clear(&self, product_id: ProductId) -> Result<u64>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct InMemoryFailureStore {
        records: Mutex<Vec<FailureRecord>>,
        unavailable: AtomicBool,
    }

    impl InMemoryFailureStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Rows currently stored for `product_id` (pruned or not)
        pub fn stored_count(&self, product_id: ProductId) -> usize {
            self.records
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.product_id == product_id)
                .count()
        }

        /// Make every call fail with a storage error
        pub fn set_unavailable(&self, unavailable: bool) {
            self.unavailable.store(unavailable, Ordering::SeqCst);
        }

        fn check_available(&self) -> Result<()> {
            if self.unavailable.load(Ordering::SeqCst) {
                return Err(AppError::Storage("failure store unavailable".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl FailureStore for InMemoryFailureStore {
        async fn record(&self, record: FailureRecord) -> Result<()> {
            self.check_available()?;
            self.records.lock().unwrap().push(record);
            Ok(())
        }

        async fn list_since(
            &self,
            product_id: ProductId,
            since: i64,
        ) -> Result<Vec<FailureRecord>> {
            self.check_available()?;
            Ok(self
                .records
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.product_id == product_id && r.failed_at >= since)
                .copied()
                .collect())
        }

        async fn prune_before(&self, product_id: ProductId, before: i64) -> Result<u64> {
            self.check_available()?;
            let mut records = self.records.lock().unwrap();
            let len = records.len();
            records.retain(|r| !(r.product_id == product_id && r.failed_at < before));
            Ok((len - records.len()) as u64)
        }

        async fn clear(&self, product_id: ProductId) -> Result<u64> {
            self.check_available()?;
            let mut records = self.records.lock().unwrap();
            let len = records.len();
            records.retain(|r| r.product_id != product_id);
            Ok((len - records.len()) as u64)
        }
    }
}
