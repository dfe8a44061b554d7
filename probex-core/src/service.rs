//! Orchestration service wrapping the job store: input validation,
//! request/response shaping, and existence checks before mutation.

use std::sync::Arc;

use crate::api_types::{JobResponse, JobStatusUpdateRequest, NewJobRequest};
use crate::error::{ProbeError, Result};
use crate::job::{Job, JobId, JobStatus, StatusUpdate};
use crate::store::JobStore;

#[derive(Clone)]
pub struct JobService {
    store: Arc<dyn JobStore>,
}

impl std::fmt::Debug for JobService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobService").finish_non_exhaustive()
    }
}

impl JobService {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    pub async fn create_job(&self, request: NewJobRequest) -> Result<JobResponse> {
        let job = Job::new(&request.name, &request.src_url)?;
        let response = JobResponse::from(&job);
        self.store.save(job).await?;
        Ok(response)
    }

    pub async fn get_job_by_id(&self, id: JobId) -> Result<JobResponse> {
        let job = self.store.find_by_id(id).await?;
        Ok(JobResponse::from(&job))
    }

    /// All jobs, optionally narrowed to one status. A non-empty filter
    /// string that is not a valid status is `InvalidInput`.
    pub async fn list_jobs(&self, status_filter: Option<&str>) -> Result<Vec<JobResponse>> {
        let filter = match status_filter {
            Some(raw) if !raw.trim().is_empty() => Some(raw.parse::<JobStatus>()?),
            _ => None,
        };
        let jobs = self.store.find_all(filter).await?;
        Ok(jobs.iter().map(JobResponse::from).collect())
    }

    pub async fn delete_job_by_id(&self, id: JobId) -> Result<()> {
        self.ensure_exists(id).await?;
        self.store.delete_by_id(id).await
    }

    /// Status update from the wire: existence first, then parse, then
    /// delegate.
    pub async fn update_status(&self, id: JobId, request: JobStatusUpdateRequest) -> Result<()> {
        self.ensure_exists(id).await?;
        let update = StatusUpdate::parse(&request.status, &request.error_msg)?;
        self.store.set_status(id, update).await
    }

    /// Typed status update for in-process callers (the worker loop).
    pub async fn set_status(&self, id: JobId, update: StatusUpdate) -> Result<()> {
        self.ensure_exists(id).await?;
        self.store.set_status(id, update).await
    }

    pub async fn attach_result(&self, id: JobId, tech_info: &str) -> Result<()> {
        self.ensure_exists(id).await?;
        self.store.set_result(id, tech_info).await
    }

    /// Read-only peek at the next eligible job, for diagnostics.
    pub async fn next_job(&self) -> Result<JobResponse> {
        let job = self.store.get_next().await?;
        Ok(JobResponse::from(&job))
    }

    /// Atomically claim the next eligible job for the worker; the
    /// returned job is already marked `Running`.
    pub async fn claim_next_job(&self) -> Result<Job> {
        self.store.claim_next().await
    }

    /// Storage backends raise different native not-found signals; this
    /// re-check keeps the message uniform across them.
    async fn ensure_exists(&self, id: JobId) -> Result<()> {
        match self.store.find_by_id(id).await {
            Ok(_) => Ok(()),
            Err(err) if err.is_not_found() => Err(ProbeError::NotFound(format!(
                "job with id {id} does not exist"
            ))),
            Err(err) => Err(err),
        }
    }
}
