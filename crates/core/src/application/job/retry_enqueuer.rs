// Retry Enqueuer
// Turns retry signals into explicit-id job runs

use super::runner::BatchedJobRunner;
use crate::application::constants::{JOB_DELETE_PRODUCTS, JOB_UPDATE_PRODUCTS};
use crate::application::state_tracker::SyncStateTracker;
use crate::domain::{JobPayload, ProductId, ProductRef, SyncKind, SyncOutcome};
use crate::error::Result;
use crate::port::SyncListener;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info};

pub struct RetryEnqueuer {
    runner: Arc<BatchedJobRunner>,
    states: Arc<SyncStateTracker>,
}

impl RetryEnqueuer {
    pub fn new(runner: Arc<BatchedJobRunner>, states: Arc<SyncStateTracker>) -> Self {
        Self { runner, states }
    }

    async fn enqueue(&self, kind: SyncKind, products: &[ProductRef]) -> Result<()> {
        let ids: Vec<ProductId> = products.iter().map(|p| p.id).collect();
        let job_name = match kind {
            SyncKind::Update => {
                self.states.mark_as_pending(products).await?;
                JOB_UPDATE_PRODUCTS
            }
            SyncKind::Delete => JOB_DELETE_PRODUCTS,
        };

        let run_id = self
            .runner
            .start(job_name, JobPayload::product_ids(&ids))
            .await?;
        info!(job_id = %run_id, job_name = job_name, items = ids.len(), "Retry scheduled");
        Ok(())
    }
}

#[async_trait]
impl SyncListener for RetryEnqueuer {
    async fn on_retry_requested(&self, kind: SyncKind, products: &[ProductRef]) {
        if let Err(e) = self.enqueue(kind, products).await {
            error!(kind = %kind, items = products.len(), error = %e, "Failed to schedule retry");
        }
    }

    async fn on_completed(&self, kind: SyncKind, outcome: &SyncOutcome) {
        debug!(
            kind = %kind,
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "Sync completed"
        );
    }
}
