// Job Run Domain Model (batched background jobs)

use super::error::{DomainError, Result};
use super::product::ProductId;
use serde::{Deserialize, Serialize};

/// Job run ID (UUID v4)
pub type JobRunId = String;

/// Lifecycle of one job run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Scheduled,
    Running,
    Completed,
    Failed,
}

impl JobState {
    pub const ALL: [JobState; 4] = [
        JobState::Scheduled,
        JobState::Running,
        JobState::Completed,
        JobState::Failed,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Scheduled => write!(f, "SCHEDULED"),
            JobState::Running => write!(f, "RUNNING"),
            JobState::Completed => write!(f, "COMPLETED"),
            JobState::Failed => write!(f, "FAILED"),
        }
    }
}

impl std::str::FromStr for JobState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SCHEDULED" => Ok(JobState::Scheduled),
            "RUNNING" => Ok(JobState::Running),
            "COMPLETED" => Ok(JobState::Completed),
            "FAILED" => Ok(JobState::Failed),
            other => Err(DomainError::UnknownValue {
                kind: "job state",
                value: other.to_string(),
            }),
        }
    }
}

/// Job Payload (JSON serializable job arguments)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPayload(serde_json::Value);

impl JobPayload {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn empty() -> Self {
        Self(serde_json::json!({}))
    }

    /// Payload of the explicit-id jobs: `{"product_ids": [..]}`
    pub fn product_ids(ids: &[ProductId]) -> Self {
        Self(serde_json::json!({ "product_ids": ids }))
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn read_product_ids(&self) -> Result<Vec<ProductId>> {
        let ids = self
            .0
            .get("product_ids")
            .ok_or_else(|| DomainError::InvalidPayload("missing product_ids".to_string()))?;
        serde_json::from_value(ids.clone())
            .map_err(|e| DomainError::InvalidPayload(format!("product_ids: {}", e)))
    }
}

/// One page of a batched job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchWindow {
    /// 1-based, increments once per processed batch
    pub number: u32,
    pub size: usize,
}

impl BatchWindow {
    pub fn new(number: u32, size: usize) -> Self {
        Self { number, size }
    }

    pub fn offset(&self) -> usize {
        (self.number.saturating_sub(1) as usize).saturating_mul(self.size)
    }
}

/// Unit of scheduled work: run batch `batch_number` of job run `run_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTick {
    pub run_id: JobRunId,
    pub job_name: String,
    pub batch_number: u32,
}

/// Persisted state of one job run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRun {
    pub id: JobRunId,
    pub name: String,
    pub payload: JobPayload,
    /// Next batch to process; monotonically increasing within a run
    pub batch_number: u32,
    pub state: JobState,

    pub created_at: i64, // epoch ms
    pub started_at: Option<i64>,
    pub finished_at: Option<i64>,

    pub items_processed: u64,
    pub error: Option<String>,
}

impl JobRun {
    /// Create a new run
    ///
    /// # Arguments
    ///
    /// * `id` - Unique run ID (injected, not generated)
    /// * `name` - Job name used to look up the job implementation
    /// * `payload` - Job arguments
    /// * `created_at` - Creation timestamp in epoch ms (injected, not system time)
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        payload: JobPayload,
        created_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            payload,
            batch_number: 1,
            state: JobState::Scheduled,
            created_at,
            started_at: None,
            finished_at: None,
            items_processed: 0,
            error: None,
        }
    }

    pub fn tick(&self) -> JobTick {
        JobTick {
            run_id: self.id.clone(),
            job_name: self.name.clone(),
            batch_number: self.batch_number,
        }
    }

    /// Scheduled -> Running (no-op when already running, ticks re-enter)
    pub fn start(&mut self, now_millis: i64) -> Result<()> {
        match self.state {
            JobState::Scheduled => {
                self.state = JobState::Running;
                self.started_at = Some(now_millis);
                Ok(())
            }
            JobState::Running => Ok(()),
            _ => Err(DomainError::InvalidStateTransition {
                from: self.state.to_string(),
                to: JobState::Running.to_string(),
            }),
        }
    }

    /// Record a processed batch and move to the next one
    pub fn advance(&mut self, processed_batch: u32, items: usize) -> Result<()> {
        if self.state != JobState::Running {
            return Err(DomainError::InvalidStateTransition {
                from: self.state.to_string(),
                to: JobState::Running.to_string(),
            });
        }
        // Replayed batch: cursor and counter already account for it
        if processed_batch < self.batch_number {
            return Ok(());
        }
        self.batch_number = processed_batch.saturating_add(1);
        self.items_processed += items as u64;
        Ok(())
    }

    /// Running -> Completed
    pub fn complete(&mut self, now_millis: i64) -> Result<()> {
        if self.state != JobState::Running {
            return Err(DomainError::InvalidStateTransition {
                from: self.state.to_string(),
                to: JobState::Completed.to_string(),
            });
        }
        self.state = JobState::Completed;
        self.finished_at = Some(now_millis);
        Ok(())
    }

    /// Mark as Failed with reason
    pub fn fail(&mut self, reason: impl Into<String>, now_millis: i64) {
        self.state = JobState::Failed;
        self.error = Some(reason.into());
        self.finished_at = Some(now_millis);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_run_lifecycle() {
        let mut run = JobRun::new("run-1", "delete_all_products", JobPayload::empty(), 1000);
        assert_eq!(run.state, JobState::Scheduled);
        assert_eq!(run.batch_number, 1);

        run.start(2000).unwrap();
        assert_eq!(run.state, JobState::Running);
        assert_eq!(run.started_at, Some(2000));

        run.advance(1, 2).unwrap();
        assert_eq!(run.batch_number, 2);
        assert_eq!(run.items_processed, 2);

        run.complete(3000).unwrap();
        assert_eq!(run.state, JobState::Completed);
        assert!(run.state.is_terminal());
    }

    #[test]
    fn test_cannot_start_terminal_run() {
        let mut run = JobRun::new("run-2", "x", JobPayload::empty(), 0);
        run.fail("boom", 10);
        assert!(run.start(20).is_err());
        assert_eq!(run.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_advance_never_moves_backwards() {
        let mut run = JobRun::new("run-3", "x", JobPayload::empty(), 0);
        run.start(1).unwrap();
        run.advance(3, 10).unwrap();
        run.advance(1, 10).unwrap();
        assert_eq!(run.batch_number, 4);
        assert_eq!(run.items_processed, 10);

        // Replay of the same batch is a no-op
        run.advance(3, 10).unwrap();
        assert_eq!(run.batch_number, 4);
        assert_eq!(run.items_processed, 10);
    }

    #[test]
    fn test_batch_window_offset() {
        assert_eq!(BatchWindow::new(1, 100).offset(), 0);
        assert_eq!(BatchWindow::new(3, 100).offset(), 200);
    }

    #[test]
    fn test_payload_product_ids() {
        let payload = JobPayload::product_ids(&[55, 56]);
        assert_eq!(payload.read_product_ids().unwrap(), vec![55, 56]);
        assert!(JobPayload::empty().read_product_ids().is_err());
    }
}
