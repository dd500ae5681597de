// Job Dispatcher - tokio-backed scheduling substrate
// Ticks travel over an in-process channel; each tick runs on its own task.

use super::registry::JobRegistry;
use super::runner::{BatchedJobRunner, TickOutcome};
use super::shutdown::ShutdownToken;
use crate::application::constants::DISPATCHER_SHUTDOWN_GRACE;
use crate::domain::{JobRunId, JobTick};
use crate::error::{AppError, Result};
use crate::port::JobScheduler;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, error, info, warn};

/// `JobScheduler` that hands ticks to a running `JobDispatcher`
#[derive(Clone)]
pub struct TokioJobScheduler {
    tx: mpsc::UnboundedSender<JobTick>,
}

/// Receiving end of a `TokioJobScheduler`
pub struct TickReceiver {
    rx: mpsc::UnboundedReceiver<JobTick>,
}

impl TokioJobScheduler {
    pub fn channel() -> (Self, TickReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, TickReceiver { rx })
    }
}

#[async_trait]
impl JobScheduler for TokioJobScheduler {
    async fn schedule(&self, tick: JobTick) -> Result<()> {
        self.tx
            .send(tick)
            .map_err(|e| AppError::Job(format!("dispatcher is not running (run {})", e.0.run_id)))
    }
}

/// Receives ticks and runs them, one in flight per job run
pub struct JobDispatcher {
    runner: Arc<BatchedJobRunner>,
    registry: Arc<JobRegistry>,
    ticks: TickReceiver,
    grace: Duration,
}

impl JobDispatcher {
    pub fn new(
        runner: Arc<BatchedJobRunner>,
        registry: Arc<JobRegistry>,
        ticks: TickReceiver,
    ) -> Self {
        Self {
            runner,
            registry,
            ticks,
            grace: DISPATCHER_SHUTDOWN_GRACE,
        }
    }

    /// How long shutdown waits for in-flight ticks before aborting them
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Dispatch loop. Returns after shutdown once in-flight ticks finished
    /// (or the grace period elapsed).
    pub async fn run(self, mut shutdown: ShutdownToken) -> Result<()> {
        let JobDispatcher {
            runner,
            registry,
            mut ticks,
            grace,
        } = self;
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<JobRunId>();
        let mut in_flight: HashMap<JobRunId, JoinHandle<()>> = HashMap::new();
        let mut deferred: HashMap<JobRunId, VecDeque<JobTick>> = HashMap::new();

        info!(jobs = ?registry.names(), "Job dispatcher started");
        loop {
            if shutdown.is_shutdown() {
                break;
            }
            tokio::select! {
                _ = shutdown.wait() => {
                    info!("Job dispatcher interrupted");
                    break;
                }
                Some(run_id) = done_rx.recv() => {
                    in_flight.remove(&run_id);
                    let next = deferred.get_mut(&run_id).and_then(VecDeque::pop_front);
                    if deferred.get(&run_id).is_some_and(VecDeque::is_empty) {
                        deferred.remove(&run_id);
                    }
                    if let Some(tick) = next {
                        let handle = spawn_tick(tick, &runner, &registry, &done_tx);
                        in_flight.insert(run_id, handle);
                    }
                }
                tick = ticks.rx.recv() => {
                    let Some(tick) = tick else {
                        info!("Tick channel closed");
                        break;
                    };
                    if in_flight.contains_key(&tick.run_id) {
                        debug!(job_id = %tick.run_id, batch = tick.batch_number, "Run busy, deferring tick");
                        deferred.entry(tick.run_id.clone()).or_default().push_back(tick);
                        continue;
                    }
                    let run_id = tick.run_id.clone();
                    let handle = spawn_tick(tick, &runner, &registry, &done_tx);
                    in_flight.insert(run_id, handle);
                }
            }
        }

        drain(in_flight, grace).await;
        info!("Job dispatcher stopped");
        Ok(())
    }
}

/// Aborts the wrapped task when dropped
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Run one tick on its own task; a panic fails the run instead of the dispatcher.
/// Aborting the returned handle also aborts the job code it is awaiting.
fn spawn_tick(
    tick: JobTick,
    runner: &Arc<BatchedJobRunner>,
    registry: &Arc<JobRegistry>,
    done: &mpsc::UnboundedSender<JobRunId>,
) -> JoinHandle<()> {
    let runner = Arc::clone(runner);
    let registry = Arc::clone(registry);
    let done = done.clone();

    tokio::spawn(async move {
        let run_id = tick.run_id.clone();

        match registry.get(&tick.job_name) {
            None => {
                let reason = format!("no job registered as '{}'", tick.job_name);
                if let Err(e) = runner.fail_run(&run_id, &reason).await {
                    error!(job_id = %run_id, error = %e, "Failed to mark run as failed");
                }
            }
            Some(job) => {
                let tick_runner = Arc::clone(&runner);
                let handle =
                    tokio::spawn(async move { tick_runner.tick(job.as_ref(), &tick).await });
                let _guard = AbortOnDrop(handle.abort_handle());

                match handle.await {
                    Ok(Ok(TickOutcome::Advanced { next_batch, items })) => {
                        debug!(job_id = %run_id, next_batch = next_batch, items = items, "Tick done");
                    }
                    Ok(Ok(outcome)) => debug!(job_id = %run_id, outcome = ?outcome, "Tick done"),
                    Ok(Err(e)) => error!(job_id = %run_id, error = %e, "Tick failed"),
                    Err(join_err) => {
                        let reason = if join_err.is_panic() {
                            "job tick panicked"
                        } else {
                            "job tick cancelled"
                        };
                        error!(job_id = %run_id, error = ?join_err, "{}", reason);
                        if let Err(e) = runner.fail_run(&run_id, reason).await {
                            error!(job_id = %run_id, error = %e, "Failed to mark run as failed");
                        }
                    }
                }
            }
        }

        let _ = done.send(run_id);
    })
}

async fn drain(in_flight: HashMap<JobRunId, JoinHandle<()>>, grace: Duration) {
    if in_flight.is_empty() {
        return;
    }
    info!(in_flight = in_flight.len(), "Waiting for in-flight ticks");

    let handles: Vec<JoinHandle<()>> = in_flight.into_values().collect();
    let aborts: Vec<_> = handles.iter().map(JoinHandle::abort_handle).collect();
    let wait_all = async {
        for handle in handles {
            let _ = handle.await;
        }
    };

    if tokio::time::timeout(grace, wait_all)
        .await
        .is_err()
    {
        warn!("Grace period elapsed, aborting in-flight ticks");
        for abort in aborts {
            abort.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::shutdown::shutdown_channel;
    use super::super::BatchedJob;
    use super::*;
    use crate::domain::{BatchWindow, JobPayload, JobRun, JobState, ProductId};
    use crate::port::job_repository::mocks::InMemoryJobRepository;
    use crate::port::time_provider::mocks::ManualTimeProvider;
    use crate::port::JobRepository;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Pages 1..=total in batches; panics on the configured id
    struct CountingJob {
        total: ProductId,
        panic_on: Option<ProductId>,
    }

    #[async_trait]
    impl BatchedJob for CountingJob {
        fn name(&self) -> &str {
            "counting"
        }

        async fn get_batch(&self, _run: &JobRun, window: BatchWindow) -> Result<Vec<ProductId>> {
            Ok((1..=self.total)
                .skip(window.offset())
                .take(window.size)
                .collect())
        }

        async fn process_items(&self, _run: &JobRun, ids: &[ProductId]) -> Result<()> {
            if let Some(id) = self.panic_on {
                if ids.contains(&id) {
                    panic!("boom on {}", id);
                }
            }
            Ok(())
        }
    }

    /// Flags its drop, so a test can tell when job code was cancelled
    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    /// Never finishes processing its single batch
    struct StuckJob {
        started: Arc<AtomicBool>,
        dropped: Arc<AtomicBool>,
    }

    #[async_trait]
    impl BatchedJob for StuckJob {
        fn name(&self) -> &str {
            "stuck"
        }

        async fn get_batch(&self, _run: &JobRun, _window: BatchWindow) -> Result<Vec<ProductId>> {
            Ok(vec![1])
        }

        async fn process_items(&self, _run: &JobRun, _ids: &[ProductId]) -> Result<()> {
            let _flag = DropFlag(self.dropped.clone());
            self.started.store(true, Ordering::SeqCst);
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    async fn wait_until(flag: &AtomicBool) -> bool {
        for _ in 0..200 {
            if flag.load(Ordering::SeqCst) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    fn setup<J: BatchedJob + 'static>(
        job: J,
    ) -> (Arc<BatchedJobRunner>, Arc<InMemoryJobRepository>, JobDispatcher) {
        let repo = Arc::new(InMemoryJobRepository::new());
        let (scheduler, ticks) = TokioJobScheduler::channel();
        let runner = Arc::new(BatchedJobRunner::new(
            repo.clone(),
            Arc::new(scheduler),
            Arc::new(ManualTimeProvider::new(0)),
            3,
        ));
        let mut registry = JobRegistry::new();
        registry.register(Arc::new(job));
        let dispatcher = JobDispatcher::new(runner.clone(), Arc::new(registry), ticks);
        (runner, repo, dispatcher)
    }

    async fn wait_for_terminal(repo: &InMemoryJobRepository, id: &str) -> JobRun {
        for _ in 0..200 {
            if let Some(run) = repo.get(id) {
                if run.state.is_terminal() {
                    return run;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("run {} did not finish", id);
    }

    #[tokio::test]
    async fn test_dispatcher_runs_job_to_completion() {
        let (runner, repo, dispatcher) = setup(CountingJob {
            total: 10,
            panic_on: None,
        });
        let (sender, token) = shutdown_channel();
        let handle = tokio::spawn(dispatcher.run(token));

        let id = runner.start("counting", JobPayload::empty()).await.unwrap();
        let run = wait_for_terminal(&repo, &id).await;

        assert_eq!(run.state, JobState::Completed);
        assert_eq!(run.items_processed, 10);
        assert_eq!(run.batch_number, 5);

        sender.shutdown();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_panicking_tick_fails_only_its_run() {
        let (runner, repo, dispatcher) = setup(CountingJob {
            total: 6,
            panic_on: Some(5),
        });
        let (sender, token) = shutdown_channel();
        let handle = tokio::spawn(dispatcher.run(token));

        let id = runner.start("counting", JobPayload::empty()).await.unwrap();
        let run = wait_for_terminal(&repo, &id).await;

        assert_eq!(run.state, JobState::Failed);
        assert_eq!(run.error.as_deref(), Some("job tick panicked"));
        assert_eq!(run.items_processed, 3);

        sender.shutdown();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_unknown_job_name_fails_run() {
        let (runner, repo, dispatcher) = setup(CountingJob {
            total: 1,
            panic_on: None,
        });
        let (sender, token) = shutdown_channel();
        let handle = tokio::spawn(dispatcher.run(token));

        let id = runner.start("nonexistent", JobPayload::empty()).await.unwrap();
        let run = wait_for_terminal(&repo, &id).await;

        assert_eq!(run.state, JobState::Failed);
        assert!(run.error.unwrap().contains("nonexistent"));
        assert_eq!(repo.count_by_state("nonexistent", JobState::Failed).await.unwrap(), 1);

        sender.shutdown();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_grace_period_aborts_stuck_job_code() {
        let started = Arc::new(AtomicBool::new(false));
        let dropped = Arc::new(AtomicBool::new(false));
        let (runner, _repo, dispatcher) = setup(StuckJob {
            started: started.clone(),
            dropped: dropped.clone(),
        });
        let dispatcher = dispatcher.with_shutdown_grace(Duration::from_millis(50));
        let (sender, token) = shutdown_channel();
        let handle = tokio::spawn(dispatcher.run(token));

        runner.start("stuck", JobPayload::empty()).await.unwrap();
        assert!(wait_until(&started).await);
        assert!(!dropped.load(Ordering::SeqCst));

        sender.shutdown();
        handle.await.unwrap().unwrap();

        // The job future itself is cancelled, not left running detached
        assert!(wait_until(&dropped).await);
    }

    #[tokio::test]
    async fn test_schedule_fails_when_dispatcher_gone() {
        let (scheduler, ticks) = TokioJobScheduler::channel();
        drop(ticks);

        let err = scheduler
            .schedule(JobTick {
                run_id: "r".to_string(),
                job_name: "counting".to_string(),
                batch_number: 1,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Job(_)));
    }
}
