// Batched Job Runner
// Persisted state machine: scheduled -> running -> {completed | failed}

use super::BatchedJob;
use crate::domain::{BatchWindow, JobPayload, JobRun, JobRunId, JobState, JobTick};
use crate::error::{AppError, Result};
use crate::port::{JobRepository, JobScheduler, TimeProvider};
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// What one tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Run already terminal, or the tick was a stale duplicate
    Skipped,
    /// Batch processed; `next_batch` has been scheduled
    Advanced { next_batch: u32, items: usize },
    /// Empty batch, run finished
    Completed,
    /// Run failed with the given reason (not rescheduled)
    Failed(String),
}

pub struct BatchedJobRunner {
    repo: Arc<dyn JobRepository>,
    scheduler: Arc<dyn JobScheduler>,
    time_provider: Arc<dyn TimeProvider>,
    batch_size: usize,
}

impl BatchedJobRunner {
    pub fn new(
        repo: Arc<dyn JobRepository>,
        scheduler: Arc<dyn JobScheduler>,
        time_provider: Arc<dyn TimeProvider>,
        batch_size: usize,
    ) -> Self {
        Self {
            repo,
            scheduler,
            time_provider,
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Persist a new run and schedule its first batch
    pub async fn start(&self, job_name: &str, payload: JobPayload) -> Result<JobRunId> {
        let run = JobRun::new(
            Uuid::new_v4().to_string(),
            job_name,
            payload,
            self.time_provider.now_millis(),
        );
        self.repo.insert(&run).await?;
        self.scheduler.schedule(run.tick()).await?;

        info!(job_id = %run.id, job_name = %run.name, "Job run scheduled");
        Ok(run.id)
    }

    /// Execute one step of the run named in `tick`
    pub async fn tick(&self, job: &dyn BatchedJob, tick: &JobTick) -> Result<TickOutcome> {
        let mut run = self
            .repo
            .find_by_id(&tick.run_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("job run {}", tick.run_id)))?;

        if run.state.is_terminal() {
            debug!(job_id = %run.id, state = %run.state, "Skipping tick of finished run");
            return Ok(TickOutcome::Skipped);
        }
        if tick.batch_number < run.batch_number {
            debug!(
                job_id = %run.id,
                batch = tick.batch_number,
                current = run.batch_number,
                "Skipping stale tick"
            );
            return Ok(TickOutcome::Skipped);
        }

        run.start(self.time_provider.now_millis())?;
        self.repo.update(&run).await?;

        let window = BatchWindow::new(tick.batch_number, self.batch_size);
        let ids = match job.get_batch(&run, window).await {
            Ok(ids) => ids,
            Err(e) => return self.fail(run, e).await,
        };

        if ids.is_empty() {
            run.complete(self.time_provider.now_millis())?;
            self.repo.update(&run).await?;
            info!(
                job_id = %run.id,
                job_name = %run.name,
                items = run.items_processed,
                "Job run completed"
            );
            return Ok(TickOutcome::Completed);
        }

        if let Err(e) = job.process_items(&run, &ids).await {
            return self.fail(run, e).await;
        }

        run.advance(tick.batch_number, ids.len())?;
        self.repo.update(&run).await?;
        self.scheduler.schedule(run.tick()).await?;

        debug!(
            job_id = %run.id,
            batch = tick.batch_number,
            items = ids.len(),
            "Batch processed"
        );
        Ok(TickOutcome::Advanced {
            next_batch: run.batch_number,
            items: ids.len(),
        })
    }

    /// Mark a run failed from outside a tick (e.g. a panicked tick task)
    pub async fn fail_run(&self, run_id: &JobRunId, reason: &str) -> Result<()> {
        let Some(mut run) = self.repo.find_by_id(run_id).await? else {
            return Err(AppError::NotFound(format!("job run {}", run_id)));
        };
        if run.state.is_terminal() {
            return Ok(());
        }
        error!(job_id = %run.id, job_name = %run.name, reason = %reason, "Job run failed");
        run.fail(reason, self.time_provider.now_millis());
        self.repo.update(&run).await
    }

    /// Re-schedule unfinished runs at their persisted batch (crash recovery)
    pub async fn resume_unfinished(&self) -> Result<usize> {
        let mut resumed = 0;
        for state in [JobState::Running, JobState::Scheduled] {
            for run in self.repo.find_by_state(state).await? {
                info!(
                    job_id = %run.id,
                    job_name = %run.name,
                    batch = run.batch_number,
                    "Resuming unfinished job run"
                );
                self.scheduler.schedule(run.tick()).await?;
                resumed += 1;
            }
        }
        Ok(resumed)
    }

    async fn fail(&self, mut run: JobRun, cause: AppError) -> Result<TickOutcome> {
        let reason = cause.to_string();
        error!(
            job_id = %run.id,
            job_name = %run.name,
            batch = run.batch_number,
            error = %reason,
            "Job run failed"
        );
        run.fail(reason.clone(), self.time_provider.now_millis());
        self.repo.update(&run).await?;
        Ok(TickOutcome::Failed(reason))
    }
}
