// Product jobs: bulk sync/delete and explicit-id retries

use super::BatchedJob;
use crate::application::constants::{
    JOB_DELETE_ALL_PRODUCTS, JOB_DELETE_PRODUCTS, JOB_SYNC_ALL_PRODUCTS, JOB_UPDATE_PRODUCTS,
};
use crate::application::state_tracker::SyncStateTracker;
use crate::application::synchronizer::BatchSynchronizer;
use crate::domain::{BatchWindow, JobRun, ProductId, ProductRef};
use crate::error::Result;
use crate::port::{ProductCatalog, SyncStateStore};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Page of the id list carried in the run payload
fn payload_page(run: &JobRun, window: BatchWindow) -> Result<Vec<ProductId>> {
    Ok(run
        .payload
        .read_product_ids()?
        .into_iter()
        .skip(window.offset())
        .take(window.size)
        .collect())
}

fn id_refs(ids: &[ProductId]) -> Vec<ProductRef> {
    ids.iter().copied().map(ProductRef::id_only).collect()
}

/// Removes every product from the remote catalog.
///
/// Pages the tracked ids of the state store. That id set does not shrink
/// when products become unsynced, so offsets stay valid across batches.
pub struct DeleteAllProductsJob {
    states: Arc<dyn SyncStateStore>,
    synchronizer: Arc<BatchSynchronizer>,
}

impl DeleteAllProductsJob {
    pub fn new(states: Arc<dyn SyncStateStore>, synchronizer: Arc<BatchSynchronizer>) -> Self {
        Self {
            states,
            synchronizer,
        }
    }
}

#[async_trait]
impl BatchedJob for DeleteAllProductsJob {
    fn name(&self) -> &str {
        JOB_DELETE_ALL_PRODUCTS
    }

    async fn get_batch(&self, _run: &JobRun, window: BatchWindow) -> Result<Vec<ProductId>> {
        self.states.tracked_ids(window.size, window.offset()).await
    }

    async fn process_items(&self, run: &JobRun, ids: &[ProductId]) -> Result<()> {
        let outcome = self.synchronizer.delete(&id_refs(ids)).await?;
        debug!(job_id = %run.id, deleted = outcome.succeeded.len(), "Delete batch done");
        Ok(())
    }
}

/// Pushes every local product whose current version is not yet synced
pub struct SyncAllProductsJob {
    catalog: Arc<dyn ProductCatalog>,
    states: Arc<SyncStateTracker>,
    synchronizer: Arc<BatchSynchronizer>,
}

impl SyncAllProductsJob {
    pub fn new(
        catalog: Arc<dyn ProductCatalog>,
        states: Arc<SyncStateTracker>,
        synchronizer: Arc<BatchSynchronizer>,
    ) -> Self {
        Self {
            catalog,
            states,
            synchronizer,
        }
    }
}

#[async_trait]
impl BatchedJob for SyncAllProductsJob {
    fn name(&self) -> &str {
        JOB_SYNC_ALL_PRODUCTS
    }

    async fn get_batch(&self, _run: &JobRun, window: BatchWindow) -> Result<Vec<ProductId>> {
        self.catalog.page_ids(window).await
    }

    async fn process_items(&self, run: &JobRun, ids: &[ProductId]) -> Result<()> {
        let products = self.catalog.find_by_ids(ids).await?;
        let outdated = self.states.filter_outdated(products).await?;
        if outdated.is_empty() {
            debug!(job_id = %run.id, "Batch already up to date");
            return Ok(());
        }
        self.synchronizer.update(&outdated).await?;
        Ok(())
    }
}

/// Updates an explicit list of products (`{"product_ids": [...]}`)
pub struct UpdateProductsJob {
    catalog: Arc<dyn ProductCatalog>,
    synchronizer: Arc<BatchSynchronizer>,
}

impl UpdateProductsJob {
    pub fn new(catalog: Arc<dyn ProductCatalog>, synchronizer: Arc<BatchSynchronizer>) -> Self {
        Self {
            catalog,
            synchronizer,
        }
    }
}

#[async_trait]
impl BatchedJob for UpdateProductsJob {
    fn name(&self) -> &str {
        JOB_UPDATE_PRODUCTS
    }

    async fn get_batch(&self, run: &JobRun, window: BatchWindow) -> Result<Vec<ProductId>> {
        payload_page(run, window)
    }

    async fn process_items(&self, _run: &JobRun, ids: &[ProductId]) -> Result<()> {
        let products = self.catalog.find_by_ids(ids).await?;
        self.synchronizer.update(&products).await?;
        Ok(())
    }
}

/// Deletes an explicit list of products (`{"product_ids": [...]}`)
pub struct DeleteProductsJob {
    synchronizer: Arc<BatchSynchronizer>,
}

impl DeleteProductsJob {
    pub fn new(synchronizer: Arc<BatchSynchronizer>) -> Self {
        Self { synchronizer }
    }
}

#[async_trait]
impl BatchedJob for DeleteProductsJob {
    fn name(&self) -> &str {
        JOB_DELETE_PRODUCTS
    }

    async fn get_batch(&self, run: &JobRun, window: BatchWindow) -> Result<Vec<ProductId>> {
        payload_page(run, window)
    }

    async fn process_items(&self, _run: &JobRun, ids: &[ProductId]) -> Result<()> {
        self.synchronizer.delete(&id_refs(ids)).await?;
        Ok(())
    }
}
