//! Types crossing the API boundary. Field names follow the JSON wire
//! format of the service (`job_id`, `src_url`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::job::Job;

/// Response shape for a single job.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct JobResponse {
    pub job_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub modified_at: DateTime<Utc>,
    pub modified_by: String,
    pub src_url: String,
    pub status: String,
    pub error_msg: String,
    pub tech_info: String,
}

impl From<&Job> for JobResponse {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.id.to_string(),
            name: job.name.clone(),
            created_at: job.created_at,
            created_by: job.created_by.clone(),
            modified_at: job.modified_at,
            modified_by: job.modified_by.clone(),
            src_url: job.src_url.clone(),
            status: job.status.to_string(),
            error_msg: job.error_msg.clone(),
            tech_info: job.tech_info.clone(),
        }
    }
}

/// Creation request. `name` may be blank; `src_url` may not.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct NewJobRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub src_url: String,
}

/// Status-update request carrying the raw status text; parsed into
/// the closed enum at the service boundary.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct JobStatusUpdateRequest {
    pub status: String,
    #[serde(default)]
    pub error_msg: String,
}

/// Result attachment request.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct JobResultRequest {
    #[serde(default)]
    pub tech_info: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_response_mirrors_job_fields() {
        let job = Job::new("my new job", "https://server/path/file.ext").unwrap();
        let response = JobResponse::from(&job);
        assert_eq!(response.job_id, job.id.to_string());
        assert_eq!(response.name, "my new job");
        assert_eq!(response.src_url, "https://server/path/file.ext");
        assert_eq!(response.status, "created");
        assert!(response.error_msg.is_empty());
        assert!(response.tech_info.is_empty());
    }

    #[test]
    fn new_job_request_fields_default_to_empty() {
        let request: NewJobRequest = serde_json::from_str("{}").unwrap();
        assert!(request.name.is_empty());
        assert!(request.src_url.is_empty());
    }
}
