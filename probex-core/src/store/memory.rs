use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::{JobStore, not_found_by_id};
use crate::error::{ProbeError, Result};
use crate::job::{Job, JobId, JobStatus, StatusUpdate};

/// In-memory job store behind a single coarse lock. One exclusive
/// guard around the whole map keeps every operation a consistent
/// snapshot; at this scale a per-record lock buys nothing.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    jobs: Mutex<HashMap<JobId, Job>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Earliest `created_at` wins; equal timestamps fall back to
    /// ascending id so each call has a single deterministic winner.
    fn select_next(jobs: &HashMap<JobId, Job>) -> Option<JobId> {
        jobs.values()
            .filter(|job| job.status == JobStatus::Created)
            .min_by_key(|job| (job.created_at, job.id))
            .map(|job| job.id)
    }

    fn apply_status(job: &mut Job, update: StatusUpdate) {
        job.status = update.status;
        job.error_msg = if update.status == JobStatus::Failed {
            update.error_message
        } else {
            String::new()
        };
        touch(job);
    }
}

/// `modified_at` must be monotonically non-decreasing per job, even if
/// the wall clock steps backwards.
fn touch(job: &mut Job) {
    job.modified_at = Utc::now().max(job.modified_at);
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn find_all(&self, status_filter: Option<JobStatus>) -> Result<Vec<Job>> {
        let jobs = self.jobs.lock().await;
        if jobs.is_empty() {
            return Err(ProbeError::NotFound("no jobs in store".to_string()));
        }
        let mut result: Vec<Job> = match status_filter {
            None => jobs.values().cloned().collect(),
            Some(status) => jobs
                .values()
                .filter(|job| job.status == status)
                .cloned()
                .collect(),
        };
        if result.is_empty() {
            // Only reachable with a filter; the unfiltered case
            // returned above on an empty map.
            let status = status_filter.map(|s| s.to_string()).unwrap_or_default();
            return Err(ProbeError::NotFound(format!(
                "no jobs with status {status}"
            )));
        }
        result.sort_by_key(|job| (job.created_at, job.id));
        Ok(result)
    }

    async fn find_by_id(&self, id: JobId) -> Result<Job> {
        let jobs = self.jobs.lock().await;
        jobs.get(&id).cloned().ok_or_else(|| not_found_by_id(id))
    }

    async fn save(&self, mut job: Job) -> Result<()> {
        let mut jobs = self.jobs.lock().await;
        touch(&mut job);
        jobs.insert(job.id, job);
        Ok(())
    }

    async fn delete_by_id(&self, id: JobId) -> Result<()> {
        let mut jobs = self.jobs.lock().await;
        jobs.remove(&id).map(|_| ()).ok_or_else(|| not_found_by_id(id))
    }

    async fn get_next(&self) -> Result<Job> {
        let jobs = self.jobs.lock().await;
        Self::select_next(&jobs)
            .and_then(|id| jobs.get(&id).cloned())
            .ok_or_else(|| ProbeError::NotFound("no job waiting to be processed".to_string()))
    }

    async fn claim_next(&self) -> Result<Job> {
        let mut jobs = self.jobs.lock().await;
        let id = Self::select_next(&jobs)
            .ok_or_else(|| ProbeError::NotFound("no job waiting to be processed".to_string()))?;
        let job = jobs
            .get_mut(&id)
            .ok_or_else(|| ProbeError::Internal(format!("selected job {id} vanished")))?;
        Self::apply_status(job, StatusUpdate::new(JobStatus::Running, ""));
        Ok(job.clone())
    }

    async fn set_status(&self, id: JobId, update: StatusUpdate) -> Result<()> {
        let mut jobs = self.jobs.lock().await;
        let job = jobs.get_mut(&id).ok_or_else(|| not_found_by_id(id))?;
        Self::apply_status(job, update);
        Ok(())
    }

    async fn set_result(&self, id: JobId, tech_info: &str) -> Result<()> {
        let mut jobs = self.jobs.lock().await;
        let job = jobs.get_mut(&id).ok_or_else(|| not_found_by_id(id))?;
        job.tech_info = tech_info.to_string();
        touch(job);
        Ok(())
    }
}
