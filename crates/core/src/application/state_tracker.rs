// Sync State Tracker
// Records per-product sync status in the external state store

use crate::domain::{
    ErrorRecord, Product, ProductId, ProductRef, SyncState, SyncStatus, SyncedItem,
};
use crate::error::Result;
use crate::port::{SyncStateStore, TimeProvider};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub struct SyncStateTracker {
    store: Arc<dyn SyncStateStore>,
    time_provider: Arc<dyn TimeProvider>,
}

impl SyncStateTracker {
    pub fn new(store: Arc<dyn SyncStateStore>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            store,
            time_provider,
        }
    }

    pub async fn state(&self, id: ProductId) -> Result<Option<SyncState>> {
        self.store.get(id).await
    }

    /// Record a remote acceptance (remote id and synced version)
    pub async fn mark_as_synced(&self, item: &SyncedItem) -> Result<()> {
        let state = SyncState::synced(item, self.time_provider.now_millis());
        debug!(product_id = item.product.id, remote_id = %item.remote_id, "Marked synced");
        self.store.put(&state).await
    }

    /// Record a failure; the last error stays visible to operators
    pub async fn mark_as_invalid(&self, error: &ErrorRecord) -> Result<()> {
        let previous = self.store.get(error.product.id).await?;
        let state = SyncState::invalid(error, previous.as_ref(), self.time_provider.now_millis());
        debug!(product_id = error.product.id, code = %error.code, "Marked invalid");
        self.store.put(&state).await
    }

    /// Clear the remote sync marker
    pub async fn mark_as_unsynced(&self, product: &ProductRef) -> Result<()> {
        let state = SyncState::unsynced(product.clone(), self.time_provider.now_millis());
        debug!(product_id = product.id, "Marked unsynced");
        self.store.put(&state).await
    }

    /// Flag products as waiting for a scheduled retry
    pub async fn mark_as_pending(&self, products: &[ProductRef]) -> Result<()> {
        let now = self.time_provider.now_millis();
        let previous = self.states_by_id(products.iter().map(|p| p.id)).await?;

        for product in products {
            let state = SyncState::pending(product.clone(), previous.get(&product.id), now);
            self.store.put(&state).await?;
        }
        Ok(())
    }

    /// States of the given products that still have a remote copy.
    /// Input order is preserved; unknown products are skipped.
    pub async fn filter_synced(&self, products: &[ProductRef]) -> Result<Vec<SyncState>> {
        let states = self.states_by_id(products.iter().map(|p| p.id)).await?;
        Ok(products
            .iter()
            .filter_map(|p| states.get(&p.id))
            .filter(|state| state.has_remote_copy())
            .cloned()
            .collect())
    }

    /// Products whose current version differs from the synced one
    pub async fn filter_outdated(&self, products: Vec<Product>) -> Result<Vec<Product>> {
        let states = self.states_by_id(products.iter().map(|p| p.id())).await?;
        Ok(products
            .into_iter()
            .filter(|p| {
                !states
                    .get(&p.id())
                    .is_some_and(|state| state.is_up_to_date(&p.reference.version))
            })
            .collect())
    }

    /// Reset INVALID/PENDING products that have no remote copy back to
    /// UNSYNCED; returns how many were reset
    pub async fn reset_local_only(&self, products: &[ProductRef]) -> Result<usize> {
        let states = self.states_by_id(products.iter().map(|p| p.id)).await?;
        let mut reset = 0;
        for state in states.values() {
            let stale = matches!(state.status, SyncStatus::Invalid | SyncStatus::Pending);
            if stale && !state.has_remote_copy() {
                self.mark_as_unsynced(&state.product).await?;
                reset += 1;
            }
        }
        Ok(reset)
    }

    pub async fn count_by_status(&self, status: SyncStatus) -> Result<i64> {
        self.store.count_by_status(status).await
    }

    /// Most recently updated states with the given status
    pub async fn find_by_status(&self, status: SyncStatus, limit: usize) -> Result<Vec<SyncState>> {
        self.store.find_by_status(status, limit).await
    }

    async fn states_by_id(
        &self,
        ids: impl Iterator<Item = ProductId>,
    ) -> Result<HashMap<ProductId, SyncState>> {
        let ids: Vec<ProductId> = ids.collect();
        Ok(self
            .store
            .get_many(&ids)
            .await?
            .into_iter()
            .map(|state| (state.product.id, state))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::port::sync_state_store::mocks::InMemorySyncStateStore;
    use crate::port::time_provider::mocks::ManualTimeProvider;

    fn tracker() -> (SyncStateTracker, Arc<InMemorySyncStateStore>) {
        let store = Arc::new(InMemorySyncStateStore::new());
        let tracker = SyncStateTracker::new(store.clone(), Arc::new(ManualTimeProvider::new(1_000)));
        (tracker, store)
    }

    #[tokio::test]
    async fn test_invalid_keeps_remote_id_and_error() {
        let (tracker, store) = tracker();
        let product = ProductRef::new(7, "v1");

        tracker
            .mark_as_synced(&SyncedItem::new(product.clone(), "remote-7"))
            .await
            .unwrap();
        tracker
            .mark_as_invalid(&ErrorRecord::new(
                product.clone(),
                ErrorCode::InternalError,
                "backend unavailable",
            ))
            .await
            .unwrap();

        let state = store.get(7).await.unwrap().unwrap();
        assert_eq!(state.status, SyncStatus::Invalid);
        assert_eq!(state.remote_id.as_deref(), Some("remote-7"));
        assert_eq!(
            state.last_error.as_deref(),
            Some("[internal_error] backend unavailable")
        );
    }

    #[tokio::test]
    async fn test_filter_synced_skips_unknown_and_local_only() {
        let (tracker, _) = tracker();
        tracker
            .mark_as_synced(&SyncedItem::new(ProductRef::new(2, "v1"), "remote-2"))
            .await
            .unwrap();
        tracker
            .mark_as_unsynced(&ProductRef::new(3, "v1"))
            .await
            .unwrap();

        let synced = tracker
            .filter_synced(&[
                ProductRef::id_only(1),
                ProductRef::id_only(2),
                ProductRef::id_only(3),
            ])
            .await
            .unwrap();

        assert_eq!(synced.len(), 1);
        assert_eq!(synced[0].id(), 2);
    }

    #[tokio::test]
    async fn test_filter_outdated_by_version() {
        let (tracker, _) = tracker();
        let mut current = Product::simple(1, "Mug");
        let changed = Product::simple(2, "Cap");
        tracker
            .mark_as_synced(&SyncedItem::new(current.reference.clone(), "remote-1"))
            .await
            .unwrap();
        tracker
            .mark_as_synced(&SyncedItem::new(ProductRef::new(2, "v0"), "remote-2"))
            .await
            .unwrap();

        let outdated = tracker
            .filter_outdated(vec![current.clone(), changed, Product::simple(3, "New")])
            .await
            .unwrap();
        let ids: Vec<ProductId> = outdated.iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec![2, 3]);

        current.reference.version = "v2".to_string();
        assert_eq!(tracker.filter_outdated(vec![current]).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reset_local_only_leaves_remote_copies() {
        let (tracker, store) = tracker();
        let local = ProductRef::new(1, "v1");
        let remote = ProductRef::new(2, "v1");
        tracker
            .mark_as_invalid(&ErrorRecord::invalid_payload(local.clone(), "no title"))
            .await
            .unwrap();
        tracker
            .mark_as_synced(&SyncedItem::new(remote.clone(), "remote-2"))
            .await
            .unwrap();
        tracker
            .mark_as_invalid(&ErrorRecord::new(remote.clone(), ErrorCode::Other, "x"))
            .await
            .unwrap();

        let reset = tracker.reset_local_only(&[local, remote]).await.unwrap();

        assert_eq!(reset, 1);
        assert_eq!(store.status_of(1), Some(SyncStatus::Unsynced));
        assert_eq!(store.status_of(2), Some(SyncStatus::Invalid));
    }

    #[tokio::test]
    async fn test_pending_preserves_remote_id() {
        let (tracker, store) = tracker();
        let product = ProductRef::new(9, "v1");
        tracker
            .mark_as_synced(&SyncedItem::new(product.clone(), "remote-9"))
            .await
            .unwrap();

        tracker.mark_as_pending(&[product]).await.unwrap();

        let state = store.get(9).await.unwrap().unwrap();
        assert_eq!(state.status, SyncStatus::Pending);
        assert_eq!(state.remote_id.as_deref(), Some("remote-9"));
    }
}
