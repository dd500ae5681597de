// Application Layer - Sync engine components and batched jobs

pub mod constants;
pub mod entry_adapter;
pub mod failure_tracker;
pub mod job;
pub mod retry;
pub mod state_tracker;
pub mod synchronizer;

// Re-exports
pub use entry_adapter::{CatalogEntryAdapter, ProductPayload};
pub use failure_tracker::FailureThresholdTracker;
pub use job::{
    shutdown_channel, BatchedJob, BatchedJobRunner, DeleteAllProductsJob, DeleteProductsJob,
    JobDispatcher, JobMonitor, JobRegistry, JobSummary, RetryEnqueuer, ShutdownSender,
    ShutdownToken, SyncAllProductsJob, TickOutcome, TickReceiver, TokioJobScheduler,
    UpdateProductsJob,
};
pub use retry::{ConfiguredRetryPolicy, RetryPolicy};
pub use state_tracker::SyncStateTracker;
pub use synchronizer::BatchSynchronizer;
