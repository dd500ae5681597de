// Failure Threshold Tracker
// Suppresses automatic retries for items failing repeatedly within a time window

use crate::config::SyncConfig;
use crate::domain::{FailureRecord, FailureWindow, ProductRef};
use crate::error::Result;
use crate::port::{FailureStore, TimeProvider};
use std::sync::Arc;
use tracing::{debug, info};

pub struct FailureThresholdTracker {
    store: Arc<dyn FailureStore>,
    time_provider: Arc<dyn TimeProvider>,
    window_ms: i64,
    threshold: u32,
}

impl FailureThresholdTracker {
    pub fn new(
        store: Arc<dyn FailureStore>,
        time_provider: Arc<dyn TimeProvider>,
        window_ms: i64,
        threshold: u32,
    ) -> Self {
        Self {
            store,
            time_provider,
            window_ms,
            threshold,
        }
    }

    pub fn from_config(
        store: Arc<dyn FailureStore>,
        time_provider: Arc<dyn TimeProvider>,
        config: &SyncConfig,
    ) -> Self {
        Self::new(
            store,
            time_provider,
            config.failure_window_ms(),
            config.failure_threshold,
        )
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Append a failure for `product` at the current time
    pub async fn record_failure(&self, product: &ProductRef) -> Result<()> {
        let now = self.time_provider.now_millis();
        self.prune(product, now).await?;
        self.store
            .record(FailureRecord::new(product.id, now))
            .await
    }

    /// True once the in-window failure count reaches the threshold
    pub async fn is_suppressed(&self, product: &ProductRef) -> Result<bool> {
        let window = self.window(product).await?;
        let suppressed = window.attempts >= self.threshold;
        if suppressed {
            info!(
                product_id = product.id,
                attempts = window.attempts,
                threshold = self.threshold,
                "Failure threshold reached, automatic retry suppressed"
            );
        }
        Ok(suppressed)
    }

    /// Failures currently inside the window
    pub async fn window(&self, product: &ProductRef) -> Result<FailureWindow> {
        let now = self.time_provider.now_millis();
        self.prune(product, now).await?;
        let records = self.store.list_since(product.id, self.window_start(now)).await?;
        Ok(FailureWindow::from_records(product.id, &records))
    }

    /// Forget every failure of `product` (manual resync)
    pub async fn reset(&self, product: &ProductRef) -> Result<u64> {
        let removed = self.store.clear(product.id).await?;
        info!(product_id = product.id, removed = removed, "Failure history reset");
        Ok(removed)
    }

    fn window_start(&self, now: i64) -> i64 {
        now.saturating_sub(self.window_ms)
    }

    // Lazy cleanup on access
    async fn prune(&self, product: &ProductRef, now: i64) -> Result<()> {
        let pruned = self
            .store
            .prune_before(product.id, self.window_start(now))
            .await?;
        if pruned > 0 {
            debug!(product_id = product.id, pruned = pruned, "Pruned expired failures");
        }
        Ok(())
    }
}
