// Job Repository Port (Interface)

use crate::domain::{JobRun, JobRunId, JobState};
use crate::error::Result;
use async_trait::async_trait;

/// Repository interface for job run persistence
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Insert a new run
    async fn insert(&self, run: &JobRun) -> Result<()>;

    /// Find run by ID
    async fn find_by_id(&self, id: &JobRunId) -> Result<Option<JobRun>>;

    /// Overwrite run state
    async fn update(&self, run: &JobRun) -> Result<()>;

    /// Find all runs by state (for resuming unfinished runs)
    async fn find_by_state(&self, state: JobState) -> Result<Vec<JobRun>>;

    /// Count runs of a job by state
    async fn count_by_state(&self, name: &str, state: JobState) -> Result<i64>;

    /// Most recently created runs first
    async fn recent(&self, limit: usize) -> Result<Vec<JobRun>>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct InMemoryJobRepository {
        runs: Mutex<HashMap<JobRunId, JobRun>>,
    }

    impl InMemoryJobRepository {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn get(&self, id: &str) -> Option<JobRun> {
            self.runs.lock().unwrap().get(id).cloned()
        }
    }

    #[async_trait]
    impl JobRepository for InMemoryJobRepository {
        async fn insert(&self, run: &JobRun) -> Result<()> {
            let mut runs = self.runs.lock().unwrap();
            if runs.contains_key(&run.id) {
                return Err(crate::error::AppError::Storage(format!(
                    "Unique constraint violation: job run {}",
                    run.id
                )));
            }
            runs.insert(run.id.clone(), run.clone());
            Ok(())
        }

        async fn find_by_id(&self, id: &JobRunId) -> Result<Option<JobRun>> {
            Ok(self.runs.lock().unwrap().get(id).cloned())
        }

        async fn update(&self, run: &JobRun) -> Result<()> {
            self.runs
                .lock()
                .unwrap()
                .insert(run.id.clone(), run.clone());
            Ok(())
        }

        async fn find_by_state(&self, state: JobState) -> Result<Vec<JobRun>> {
            let mut found: Vec<JobRun> = self
                .runs
                .lock()
                .unwrap()
                .values()
                .filter(|run| run.state == state)
                .cloned()
                .collect();
            found.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            Ok(found)
        }

        async fn count_by_state(&self, name: &str, state: JobState) -> Result<i64> {
            Ok(self
                .runs
                .lock()
                .unwrap()
                .values()
                .filter(|run| run.name == name && run.state == state)
                .count() as i64)
        }

        async fn recent(&self, limit: usize) -> Result<Vec<JobRun>> {
            let mut runs: Vec<JobRun> = self.runs.lock().unwrap().values().cloned().collect();
            runs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            runs.truncate(limit);
            Ok(runs)
        }
    }
}
