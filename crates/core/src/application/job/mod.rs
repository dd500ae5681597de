// Batched background jobs
// One tick processes one batch, then schedules the next tick (never recurses)

mod dispatcher;
mod monitor;
mod products;
mod registry;
mod retry_enqueuer;
mod runner;
mod shutdown;

pub use dispatcher::{JobDispatcher, TickReceiver, TokioJobScheduler};
pub use monitor::{JobMonitor, JobSummary};
pub use products::{DeleteAllProductsJob, DeleteProductsJob, SyncAllProductsJob, UpdateProductsJob};
pub use registry::JobRegistry;
pub use retry_enqueuer::RetryEnqueuer;
pub use runner::{BatchedJobRunner, TickOutcome};
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use crate::domain::{BatchWindow, JobRun, ProductId};
use crate::error::Result;
use async_trait::async_trait;

/// A job processed in batches of product ids
#[async_trait]
pub trait BatchedJob: Send + Sync {
    /// Registry name; persisted with every run
    fn name(&self) -> &str;

    /// Ids of batch `window.number`; an empty batch completes the run
    async fn get_batch(&self, run: &JobRun, window: BatchWindow) -> Result<Vec<ProductId>>;

    /// Process one batch. Must be safe to repeat for the same ids.
    async fn process_items(&self, run: &JobRun, ids: &[ProductId]) -> Result<()>;
}
