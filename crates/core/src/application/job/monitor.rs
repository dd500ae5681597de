// Job Monitor - read-only view over job runs for operators

use crate::domain::{JobRun, JobRunId, JobState};
use crate::error::Result;
use crate::port::JobRepository;
use serde::Serialize;
use std::sync::Arc;

/// Run counts of one job by state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobSummary {
    pub name: String,
    pub scheduled: i64,
    pub running: i64,
    pub completed: i64,
    pub failed: i64,
}

impl JobSummary {
    /// Runs not yet finished
    pub fn active(&self) -> i64 {
        self.scheduled + self.running
    }
}

pub struct JobMonitor {
    repo: Arc<dyn JobRepository>,
}

impl JobMonitor {
    pub fn new(repo: Arc<dyn JobRepository>) -> Self {
        Self { repo }
    }

    pub async fn summary(&self, names: &[&str]) -> Result<Vec<JobSummary>> {
        let mut summaries = Vec::with_capacity(names.len());
        for name in names {
            let mut summary = JobSummary {
                name: name.to_string(),
                ..JobSummary::default()
            };
            for state in JobState::ALL {
                let count = self.repo.count_by_state(name, state).await?;
                match state {
                    JobState::Scheduled => summary.scheduled = count,
                    JobState::Running => summary.running = count,
                    JobState::Completed => summary.completed = count,
                    JobState::Failed => summary.failed = count,
                }
            }
            summaries.push(summary);
        }
        Ok(summaries)
    }

    pub async fn recent(&self, limit: usize) -> Result<Vec<JobRun>> {
        self.repo.recent(limit).await
    }

    pub async fn find(&self, id: &JobRunId) -> Result<Option<JobRun>> {
        self.repo.find_by_id(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::JobPayload;
    use crate::port::job_repository::mocks::InMemoryJobRepository;

    #[tokio::test]
    async fn test_summary_counts_by_state() {
        let repo = Arc::new(InMemoryJobRepository::new());
        let mut done = JobRun::new("a", "delete_all_products", JobPayload::empty(), 1);
        done.start(2).unwrap();
        done.complete(3).unwrap();
        let mut failed = JobRun::new("b", "delete_all_products", JobPayload::empty(), 4);
        failed.fail("boom", 5);
        let queued = JobRun::new("c", "sync_all_products", JobPayload::empty(), 6);
        for run in [&done, &failed, &queued] {
            repo.insert(run).await.unwrap();
        }

        let monitor = JobMonitor::new(repo);
        let summary = monitor
            .summary(&["delete_all_products", "sync_all_products"])
            .await
            .unwrap();

        assert_eq!(summary[0].completed, 1);
        assert_eq!(summary[0].failed, 1);
        assert_eq!(summary[0].active(), 0);
        assert_eq!(summary[1].scheduled, 1);
        assert_eq!(summary[1].active(), 1);

        let recent = monitor.recent(2).await.unwrap();
        let ids: Vec<&str> = recent.iter().map(|run| run.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b"]);
        assert!(monitor.find(&"a".to_string()).await.unwrap().is_some());
    }
}
