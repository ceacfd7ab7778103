use super::context::JobContext;
use super::job::{BackgroundJob, JobError, ShutdownBehavior};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Upper bound on waiting for a cancellable job at shutdown.
const CANCELLABLE_SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Runs one job immediately on start and then at the job's interval, until
/// stopped.
pub struct PeriodicJobRunner {
    job: Arc<dyn BackgroundJob>,
    shutdown_token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicJobRunner {
    pub fn new(job: Arc<dyn BackgroundJob>) -> Self {
        Self {
            job,
            shutdown_token: CancellationToken::new(),
            handle: None,
        }
    }

    /// Spawns the run loop. Calling it on a running runner does nothing.
    pub fn start(&mut self) {
        if self.is_running() {
            warn!("Job {} is already running", self.job.id());
            return;
        }

        self.shutdown_token = CancellationToken::new();
        info!(
            "Starting job {} ({}), every {:?}",
            self.job.id(),
            self.job.name(),
            self.job.interval()
        );
        let job = Arc::clone(&self.job);
        let token = self.shutdown_token.clone();
        self.handle = Some(tokio::spawn(run_loop(job, token)));
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Prevents further runs. A run in progress is awaited when the job asks
    /// for it, otherwise it is cancelled and given a grace period.
    pub async fn stop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        info!("Stopping job {}", self.job.id());
        self.shutdown_token.cancel();

        match self.job.shutdown_behavior() {
            ShutdownBehavior::WaitForCompletion => {
                if let Err(e) = handle.await {
                    error!("Job {} loop ended abnormally: {}", self.job.id(), e);
                }
            }
            ShutdownBehavior::Cancellable => {
                if tokio::time::timeout(CANCELLABLE_SHUTDOWN_GRACE, handle)
                    .await
                    .is_err()
                {
                    warn!(
                        "Job {} did not stop within {:?}",
                        self.job.id(),
                        CANCELLABLE_SHUTDOWN_GRACE
                    );
                }
            }
        }
        info!("Job {} stopped", self.job.id());
    }
}

async fn run_loop(job: Arc<dyn BackgroundJob>, shutdown_token: CancellationToken) {
    // tokio rejects a zero period
    let period = job.interval().max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = shutdown_token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let ctx = JobContext::new(shutdown_token.child_token());
        let job_ref = Arc::clone(&job);
        let start_time = Instant::now();
        let result = tokio::task::spawn_blocking(move || job_ref.execute(&ctx)).await;
        let elapsed = start_time.elapsed();

        match result {
            Ok(Ok(())) => debug!("Job {} completed in {:?}", job.id(), elapsed),
            Ok(Err(JobError::Cancelled)) => {
                info!("Job {} was cancelled after {:?}", job.id(), elapsed)
            }
            Ok(Err(e)) => error!("Job {} failed after {:?}: {}", job.id(), elapsed, e),
            Err(e) => error!("Job {} panicked after {:?}: {}", job.id(), elapsed, e),
        }
    }

    debug!("Job {} loop exited", job.id());
}
