// Sync State Store Port (Interface)
// Backing store is external: the catalog platform's own metadata store

use crate::domain::{ProductId, SyncState, SyncStatus};
use crate::error::Result;
use async_trait::async_trait;

/// Persistence for per-product sync state. All writes are overwrites.
#[async_trait]
pub trait SyncStateStore: Send + Sync {
    /// Find state by product ID
    async fn get(&self, id: ProductId) -> Result<Option<SyncState>>;

    /// Find states for several products (missing ones are skipped)
    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<SyncState>>;

    /// Insert or overwrite the state of one product
    async fn put(&self, state: &SyncState) -> Result<()>;

    /// Page of every tracked product id in ascending order.
    /// Stable under status changes since rows are never removed.
    async fn tracked_ids(&self, limit: usize, offset: usize) -> Result<Vec<ProductId>>;

    /// Find states by status, most recently updated first
    async fn find_by_status(&self, status: SyncStatus, limit: usize) -> Result<Vec<SyncState>>;

    /// Count products by status
    async fn count_by_status(&self, status: SyncStatus) -> Result<i64>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// In-memory store (ordered by product id)
    #[derive(Default)]
    pub struct InMemorySyncStateStore {
        states: Mutex<BTreeMap<ProductId, SyncState>>,
        writes: Mutex<usize>,
    }

    impl InMemorySyncStateStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_states(states: Vec<SyncState>) -> Self {
            let store = Self::new();
            {
                let mut map = store.states.lock().unwrap();
                for state in states {
                    map.insert(state.product.id, state);
                }
            }
            store
        }

        pub fn status_of(&self, id: ProductId) -> Option<SyncStatus> {
            self.states.lock().unwrap().get(&id).map(|s| s.status)
        }

        pub fn snapshot(&self) -> Vec<SyncState> {
            self.states.lock().unwrap().values().cloned().collect()
        }

        /// Number of `put` calls so far
        pub fn write_count(&self) -> usize {
            *self.writes.lock().unwrap()
        }
    }

    #[async_trait]
    impl SyncStateStore for InMemorySyncStateStore {
        async fn get(&self, id: ProductId) -> Result<Option<SyncState>> {
            Ok(self.states.lock().unwrap().get(&id).cloned())
        }

        async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<SyncState>> {
            let states = self.states.lock().unwrap();
            Ok(ids.iter().filter_map(|id| states.get(id).cloned()).collect())
        }

        async fn put(&self, state: &SyncState) -> Result<()> {
            *self.writes.lock().unwrap() += 1;
            self.states
                .lock()
                .unwrap()
                .insert(state.product.id, state.clone());
            Ok(())
        }

        async fn tracked_ids(&self, limit: usize, offset: usize) -> Result<Vec<ProductId>> {
            Ok(self
                .states
                .lock()
                .unwrap()
                .keys()
                .skip(offset)
                .take(limit)
                .copied()
                .collect())
        }

        async fn find_by_status(
            &self,
            status: SyncStatus,
            limit: usize,
        ) -> Result<Vec<SyncState>> {
            let mut found: Vec<SyncState> = self
                .states
                .lock()
                .unwrap()
                .values()
                .filter(|s| s.status == status)
                .cloned()
                .collect();
            found.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            found.truncate(limit);
            Ok(found)
        }

        async fn count_by_status(&self, status: SyncStatus) -> Result<i64> {
            Ok(self
                .states
                .lock()
                .unwrap()
                .values()
                .filter(|s| s.status == status)
                .count() as i64)
        }
    }
}
