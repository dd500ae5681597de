// Sync Listener Port
// Explicit observers of synchronizer outcomes (owned and registered by the caller)

use crate::domain::{ProductRef, SyncKind, SyncOutcome};
use async_trait::async_trait;

#[async_trait]
pub trait SyncListener: Send + Sync {
    /// Retry requested for items that failed with a retryable code.
    /// The engine only signals; re-enqueueing is the listener's business.
    async fn on_retry_requested(&self, kind: SyncKind, products: &[ProductRef]);

    /// Final outcome of one synchronization call (exactly once per call)
    async fn on_completed(&self, kind: SyncKind, outcome: &SyncOutcome);
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::ProductId;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingListener {
        retries: Mutex<Vec<(SyncKind, Vec<ProductId>)>>,
        completions: Mutex<Vec<(SyncKind, SyncOutcome)>>,
    }

    impl RecordingListener {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn retries(&self) -> Vec<(SyncKind, Vec<ProductId>)> {
            self.retries.lock().unwrap().clone()
        }

        pub fn completions(&self) -> Vec<(SyncKind, SyncOutcome)> {
            self.completions.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SyncListener for RecordingListener {
        async fn on_retry_requested(&self, kind: SyncKind, products: &[ProductRef]) {
            self.retries
                .lock()
                .unwrap()
                .push((kind, products.iter().map(|p| p.id).collect()));
        }

        async fn on_completed(&self, kind: SyncKind, outcome: &SyncOutcome) {
            self.completions
                .lock()
                .unwrap()
                .push((kind, outcome.clone()));
        }
    }
}
