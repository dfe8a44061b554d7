//! Single analysis worker: claims the next eligible job, fetches the
//! source bytes, runs the probe, and persists the outcome. One job in
//! flight at a time; the idle sleep between empty polls is the only
//! suspension point and the only place cancellation is observed, so a
//! claimed job always runs to completion before shutdown takes
//! effect.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::fetch::SourceFetcher;
use crate::job::{Job, JobStatus, StatusUpdate};
use crate::probe::ProbeRunner;
use crate::service::JobService;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct WorkerConfig {
    /// Wait between polls when no job is eligible.
    pub poll_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

pub struct AnalysisWorker {
    service: JobService,
    fetcher: Arc<dyn SourceFetcher>,
    prober: Arc<dyn ProbeRunner>,
    config: WorkerConfig,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for AnalysisWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisWorker")
            .field("config", &self.config)
            .field("shutdown_cancelled", &self.shutdown.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl AnalysisWorker {
    pub fn new(
        service: JobService,
        fetcher: Arc<dyn SourceFetcher>,
        prober: Arc<dyn ProbeRunner>,
        config: WorkerConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            service,
            fetcher,
            prober,
            config,
            shutdown,
        }
    }

    /// Poll-claim-execute loop. Returns once the shutdown token is
    /// cancelled and the current iteration has finished.
    pub async fn run(&self) {
        info!(
            poll_interval_secs = self.config.poll_interval.as_secs(),
            "analysis worker started"
        );
        loop {
            if self.shutdown.is_cancelled() {
                break;
            }

            match self.service.claim_next_job().await {
                Ok(job) => self.process(job).await,
                Err(err) if err.is_not_found() => {
                    tokio::select! {
                        _ = self.shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.config.poll_interval) => {}
                    }
                }
                Err(err) => {
                    // Store trouble must not kill the loop; log and
                    // retry after the usual wait.
                    error!(error = %err, "claim attempt failed");
                    tokio::select! {
                        _ = self.shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.config.poll_interval) => {}
                    }
                }
            }
        }
        info!("analysis worker stopped");
    }

    /// Drive one claimed job to a terminal status. Never propagates:
    /// every failure ends up recorded on the job instead.
    async fn process(&self, job: Job) {
        let job_id = job.id;
        info!(job = %job_id, src_url = %job.src_url, "job claimed");

        match self.analyze(&job).await {
            Ok(report) => {
                if let Err(err) = self.service.attach_result(job_id, &report).await {
                    self.finalize_failed(&job, &format!("result write-back failed: {err}"))
                        .await;
                    return;
                }
                match self
                    .service
                    .set_status(job_id, StatusUpdate::new(JobStatus::Finished, ""))
                    .await
                {
                    Ok(()) => info!(job = %job_id, "job finished"),
                    Err(err) => error!(job = %job_id, error = %err, "finish transition failed"),
                }
            }
            Err(reason) => self.finalize_failed(&job, &reason).await,
        }
    }

    /// Fetch then probe. Either failure is terminal for the job.
    async fn analyze(&self, job: &Job) -> Result<String, String> {
        let bytes = self
            .fetcher
            .fetch(&job.src_url)
            .await
            .map_err(|err| format!("source fetch failed: {err}"))?;
        self.prober
            .probe(bytes)
            .await
            .map_err(|err| format!("probe failed: {err}"))
    }

    async fn finalize_failed(&self, job: &Job, reason: &str) {
        warn!(job = %job.id, error = %reason, "job failed");
        if let Err(err) = self
            .service
            .set_status(job.id, StatusUpdate::new(JobStatus::Failed, reason))
            .await
        {
            error!(job = %job.id, error = %err, "failed-status write-back failed");
        }
    }
}
