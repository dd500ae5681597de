// Job Scheduler Port
// The scheduling substrate: runs a job tick asynchronously, later

use crate::domain::JobTick;
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait JobScheduler: Send + Sync {
    /// Schedule batch `tick.batch_number` of run `tick.run_id`.
    /// Must return without executing the tick.
    async fn schedule(&self, tick: JobTick) -> Result<()>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Collects ticks instead of running them; tests drain them by hand
    #[derive(Default)]
    pub struct RecordingScheduler {
        ticks: Mutex<VecDeque<JobTick>>,
        total: Mutex<usize>,
    }

    impl RecordingScheduler {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn pop(&self) -> Option<JobTick> {
            self.ticks.lock().unwrap().pop_front()
        }

        pub fn pending(&self) -> usize {
            self.ticks.lock().unwrap().len()
        }

        /// Ticks scheduled over the scheduler's lifetime
        pub fn total_scheduled(&self) -> usize {
            *self.total.lock().unwrap()
        }
    }

    #[async_trait]
    impl JobScheduler for RecordingScheduler {
        async fn schedule(&self, tick: JobTick) -> Result<()> {
            *self.total.lock().unwrap() += 1;
            self.ticks.lock().unwrap().push_back(tick);
            Ok(())
        }
    }
}
