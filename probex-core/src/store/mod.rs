pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::error::Result;
use crate::job::{Job, JobId, JobStatus, StatusUpdate};

pub use memory::MemoryJobStore;
pub use postgres::PgJobStore;

/// Sole keeper of job records. Implementations must keep cross-field
/// updates atomic relative to concurrent readers; the in-memory store
/// does so with one coarse lock around the whole map.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Every job when `status_filter` is `None`, otherwise only jobs in
    /// that status. An empty result is `NotFound` either way, with
    /// filter-specific wording.
    async fn find_all(&self, status_filter: Option<JobStatus>) -> Result<Vec<Job>>;

    async fn find_by_id(&self, id: JobId) -> Result<Job>;

    /// Insert-or-replace by id. Refreshes `modified_at` as part of the
    /// write. Ids are generated, never user-supplied, so no uniqueness
    /// re-check is needed.
    async fn save(&self, job: Job) -> Result<()>;

    async fn delete_by_id(&self, id: JobId) -> Result<()>;

    /// The next eligible job: earliest `created_at` among jobs in
    /// `Created` status, ties broken by ascending id. Read-only.
    async fn get_next(&self) -> Result<Job>;

    /// Like [`get_next`](JobStore::get_next), but marks the selected
    /// job `Running` inside the same critical section, so no second
    /// claimer can observe it as `Created`.
    async fn claim_next(&self) -> Result<Job>;

    /// Overwrite status and error message. The error message is kept
    /// only when the new status is `Failed` and cleared otherwise.
    async fn set_status(&self, id: JobId, update: StatusUpdate) -> Result<()>;

    /// Attach the probe output to a job.
    async fn set_result(&self, id: JobId, tech_info: &str) -> Result<()>;
}

pub(crate) fn not_found_by_id(id: JobId) -> crate::error::ProbeError {
    crate::error::ProbeError::NotFound(format!("job with id {id} not found"))
}
