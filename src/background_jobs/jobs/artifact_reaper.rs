//! Background job deleting artifacts that outlived their time to live.
//!
//! Runs independently of conversions and downloads. A download racing with a
//! deletion simply finds the file gone.

use crate::artifact_store::ArtifactStore;
use crate::background_jobs::{
    context::JobContext,
    job::{BackgroundJob, JobError, ShutdownBehavior},
};
use crate::metrics;
use std::time::Duration;

pub struct ArtifactReaperJob {
    store: ArtifactStore,
    interval: Duration,
}

impl ArtifactReaperJob {
    pub fn new(store: ArtifactStore, interval: Duration) -> Self {
        Self { store, interval }
    }
}

impl BackgroundJob for ArtifactReaperJob {
    fn id(&self) -> &'static str {
        "artifact_reaper"
    }

    fn name(&self) -> &'static str {
        "Artifact Reaper"
    }

    fn description(&self) -> &'static str {
        "Deletes converted audio files older than the configured time to live"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    fn shutdown_behavior(&self) -> ShutdownBehavior {
        // Sweeps are short; let a running one finish
        ShutdownBehavior::WaitForCompletion
    }

    fn execute(&self, ctx: &JobContext) -> Result<(), JobError> {
        if ctx.is_cancelled() {
            return Err(JobError::Cancelled);
        }

        let report = self.store.sweep();
        metrics::record_sweep(report.deleted, report.errors);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::background_jobs::PeriodicJobRunner;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;

    #[test]
    fn metadata() {
        let job = ArtifactReaperJob::new(
            ArtifactStore::new("/tmp/none", Duration::from_secs(1)),
            Duration::from_secs(3600),
        );
        assert_eq!(job.id(), "artifact_reaper");
        assert_eq!(job.interval(), Duration::from_secs(3600));
        assert_eq!(job.shutdown_behavior(), ShutdownBehavior::WaitForCompletion);
    }

    #[test]
    fn execute_sweeps_expired_files() {
        let dir = TempDir::new().unwrap();
        let old = dir.path().join("old.mp3");
        std::fs::write(&old, b"x").unwrap();
        let job = ArtifactReaperJob::new(
            ArtifactStore::new(dir.path(), Duration::ZERO),
            Duration::from_secs(3600),
        );
        // A zero TTL still needs some age
        std::thread::sleep(Duration::from_millis(20));

        job.execute(&JobContext::new(CancellationToken::new()))
            .unwrap();

        assert!(!old.exists());
    }

    #[test]
    fn cancelled_context_skips_the_sweep() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("old.mp3");
        std::fs::write(&file, b"x").unwrap();
        let job = ArtifactReaperJob::new(
            ArtifactStore::new(dir.path(), Duration::ZERO),
            Duration::from_secs(3600),
        );
        let token = CancellationToken::new();
        token.cancel();

        let result = job.execute(&JobContext::new(token));

        assert!(matches!(result, Err(JobError::Cancelled)));
        assert!(file.exists());
    }

    #[tokio::test]
    async fn runner_sweeps_at_start() {
        let dir = TempDir::new().unwrap();
        let old = dir.path().join("old.mp3");
        std::fs::write(&old, b"x").unwrap();
        std::thread::sleep(Duration::from_millis(20));
        let job = ArtifactReaperJob::new(
            ArtifactStore::new(dir.path(), Duration::ZERO),
            Duration::from_secs(3600),
        );
        let mut runner = PeriodicJobRunner::new(Arc::new(job));

        runner.start();
        for _ in 0..200 {
            if !old.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        runner.stop().await;

        assert!(!old.exists());
    }
}
