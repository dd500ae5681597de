// Batch Synchronizer
// Drives chunked create/update/delete calls against the remote catalog,
// persists per-item state after each chunk and signals retries.

use crate::application::entry_adapter::CatalogEntryAdapter;
use crate::application::failure_tracker::FailureThresholdTracker;
use crate::application::retry::{ConfiguredRetryPolicy, RetryPolicy};
use crate::application::state_tracker::SyncStateTracker;
use crate::config::SyncConfig;
use crate::domain::{
    BatchResult, ErrorCode, ErrorRecord, Product, ProductId, ProductRef, RequestEntry, SyncKind,
    SyncOutcome, SyncedItem,
};
use crate::error::{AppError, Result};
use crate::port::{IntegrationStatus, RemoteCatalogClient, SyncListener};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct BatchSynchronizer {
    adapter: CatalogEntryAdapter,
    client: Arc<dyn RemoteCatalogClient>,
    states: Arc<SyncStateTracker>,
    failures: Arc<FailureThresholdTracker>,
    integration: Arc<dyn IntegrationStatus>,
    retry_policy: Arc<dyn RetryPolicy>,
    listeners: Vec<Arc<dyn SyncListener>>,
    chunk_size: usize,
}

impl BatchSynchronizer {
    /// Create a synchronizer
    ///
    /// The chunk size is the configured one capped by the client's maximum
    /// batch size. Retries follow `config.retry` unless another policy is set
    /// with [`BatchSynchronizer::with_retry_policy`].
    pub fn new(
        client: Arc<dyn RemoteCatalogClient>,
        states: Arc<SyncStateTracker>,
        failures: Arc<FailureThresholdTracker>,
        integration: Arc<dyn IntegrationStatus>,
        config: &SyncConfig,
    ) -> Self {
        let chunk_size = config.effective_chunk_size(client.max_batch_size());
        Self {
            adapter: CatalogEntryAdapter::new(),
            client,
            states,
            failures,
            integration,
            retry_policy: Arc::new(ConfiguredRetryPolicy::new(config.retry.clone())),
            listeners: Vec::new(),
            chunk_size,
        }
    }

    pub fn with_retry_policy(mut self, policy: Arc<dyn RetryPolicy>) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn with_listener(mut self, listener: Arc<dyn SyncListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Create or update products remotely
    ///
    /// Products failing validation are marked invalid and reported as failed
    /// without ever reaching the remote client.
    pub async fn update(&self, products: &[Product]) -> Result<SyncOutcome> {
        self.ensure_setup().await?;

        let (entries, invalid) = self.adapter.build_update_entries(products);
        for record in &invalid {
            self.states.mark_as_invalid(record).await?;
        }
        if !invalid.is_empty() {
            info!(invalid = invalid.len(), "Products failed validation");
        }

        let mut outcome = SyncOutcome::empty();
        outcome.merge_errors(invalid);
        self.run(SyncKind::Update, entries, outcome).await
    }

    /// Delete products that still have a remote copy
    ///
    /// Products without one are skipped; stale INVALID/PENDING markers on
    /// them are cleared since nothing exists remotely.
    pub async fn delete(&self, products: &[ProductRef]) -> Result<SyncOutcome> {
        self.ensure_setup().await?;

        let synced = self.states.filter_synced(products).await?;
        if synced.len() < products.len() {
            let reset = self.states.reset_local_only(products).await?;
            debug!(
                requested = products.len(),
                synced = synced.len(),
                reset = reset,
                "Skipping products without a remote copy"
            );
        }

        let entries = self.adapter.build_delete_entries(&synced);
        self.run(SyncKind::Delete, entries, SyncOutcome::empty()).await
    }

    /// Submit prebuilt create/update entries (no validation)
    pub async fn update_by_entries(&self, entries: Vec<RequestEntry>) -> Result<SyncOutcome> {
        self.ensure_setup().await?;
        self.run(SyncKind::Update, entries, SyncOutcome::empty()).await
    }

    /// Submit prebuilt delete entries
    pub async fn delete_by_entries(&self, entries: Vec<RequestEntry>) -> Result<SyncOutcome> {
        self.ensure_setup().await?;
        self.run(SyncKind::Delete, entries, SyncOutcome::empty()).await
    }

    async fn ensure_setup(&self) -> Result<()> {
        if self.integration.is_setup_complete().await {
            return Ok(());
        }
        warn!("Remote catalog integration is not set up, aborting sync");
        Err(AppError::SetupIncomplete(
            "remote catalog account is not connected".to_string(),
        ))
    }

    async fn run(
        &self,
        kind: SyncKind,
        entries: Vec<RequestEntry>,
        mut outcome: SyncOutcome,
    ) -> Result<SyncOutcome> {
        let submitted = RequestEntry::id_map(&entries);
        let chunks = entries.len().div_ceil(self.chunk_size);

        for (index, chunk) in entries.chunks(self.chunk_size).enumerate() {
            let chunk_number = index + 1;
            debug!(
                kind = %kind,
                chunk = chunk_number,
                chunks = chunks,
                items = chunk.len(),
                "Submitting chunk"
            );

            let response = match kind {
                SyncKind::Update => self.client.insert_batch(chunk).await,
                SyncKind::Delete => self.client.delete_batch(chunk).await,
            };
            let result = response.map_err(|source| {
                error!(
                    kind = %kind,
                    chunk = chunk_number,
                    error = %source,
                    "Remote catalog call failed, aborting remaining chunks"
                );
                AppError::RemoteCallFailed {
                    chunk: chunk_number,
                    source,
                }
            })?;

            let result = Self::resolve_products(result, &submitted);
            self.persist_chunk(kind, &result).await?;
            outcome.merge(result);
        }

        self.signal_retries(kind, &outcome, &submitted).await;

        info!(
            kind = %kind,
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "Sync finished"
        );
        for listener in &self.listeners {
            listener.on_completed(kind, &outcome).await;
        }
        Ok(outcome)
    }

    /// Replace remote-reported product refs with the submitted ones
    fn resolve_products(
        result: BatchResult,
        submitted: &HashMap<ProductId, ProductRef>,
    ) -> BatchResult {
        let resolve = |product: ProductRef| submitted.get(&product.id).cloned().unwrap_or(product);
        BatchResult::new(
            result
                .succeeded
                .into_iter()
                .map(|item| SyncedItem::new(resolve(item.product), item.remote_id))
                .collect(),
            result
                .errors
                .into_iter()
                .map(|record| ErrorRecord::new(resolve(record.product), record.code, record.message))
                .collect(),
        )
    }

    async fn persist_chunk(&self, kind: SyncKind, result: &BatchResult) -> Result<()> {
        match kind {
            SyncKind::Update => {
                for item in &result.succeeded {
                    self.states.mark_as_synced(item).await?;
                }
                for record in &result.errors {
                    self.states.mark_as_invalid(record).await?;
                }
            }
            SyncKind::Delete => {
                for item in &result.succeeded {
                    self.states.mark_as_unsynced(&item.product).await?;
                }
                // Other delete errors leave the remote copy (and its marker) in place
                for record in &result.errors {
                    if record.code == ErrorCode::InvalidPayload {
                        self.states.mark_as_invalid(record).await?;
                    }
                }
            }
        }
        Ok(())
    }

    async fn signal_retries(
        &self,
        kind: SyncKind,
        outcome: &SyncOutcome,
        submitted: &HashMap<ProductId, ProductRef>,
    ) {
        let mut retry_errors = Vec::new();
        let mut retry_products = Vec::new();

        for record in &outcome.failed {
            if !self.retry_policy.is_retryable(record.code) {
                continue;
            }
            // Only items that were actually submitted can be retried
            let Some(product) = submitted.get(&record.product.id) else {
                continue;
            };

            // Chunks are already persisted; failure bookkeeping must not unwind the call
            let suppressed = match self.failures.is_suppressed(product).await {
                Ok(suppressed) => suppressed,
                Err(e) => {
                    warn!(
                        product_id = product.id,
                        error = %e,
                        "Failure lookup failed, treating as not suppressed"
                    );
                    false
                }
            };
            if let Err(e) = self.failures.record_failure(product).await {
                warn!(product_id = product.id, error = %e, "Failed to record failure");
            }
            if suppressed {
                continue;
            }
            retry_errors.push(record.clone());
            retry_products.push(product.clone());
        }

        if retry_products.is_empty() || !self.retry_policy.should_retry(kind, &retry_errors) {
            return;
        }

        info!(kind = %kind, items = retry_products.len(), "Requesting retry");
        for listener in &self.listeners {
            listener.on_retry_requested(kind, &retry_products).await;
        }
    }
}
