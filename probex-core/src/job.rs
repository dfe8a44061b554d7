use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ProbeError, Result};

/// Unique identifier for probe jobs. Uuid v7 ids are time-sortable,
/// so identifier order doubles as creation order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parse an id received over the wire.
    pub fn parse(raw: &str) -> Result<Self> {
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| ProbeError::InvalidInput(format!("job id must be a uuid: {raw}")))
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job lifecycle states. `Created` is the sole initial state;
/// `Finished` and `Failed` are terminal under the worker loop.
/// `Queued` and `Paused` are reachable through the status-update API
/// only; the worker never produces them.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Created,
    Queued,
    Running,
    Paused,
    Finished,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Created => "created",
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Paused => "paused",
            JobStatus::Finished => "finished",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = ProbeError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw {
            "created" => Ok(JobStatus::Created),
            "queued" => Ok(JobStatus::Queued),
            "running" => Ok(JobStatus::Running),
            "paused" => Ok(JobStatus::Paused),
            "finished" => Ok(JobStatus::Finished),
            "failed" => Ok(JobStatus::Failed),
            other => Err(ProbeError::InvalidInput(format!(
                "could not parse status value {other}"
            ))),
        }
    }
}

/// A parsed status-update request. Construction goes through
/// [`StatusUpdate::parse`] so raw strings never cross into the store.
///
/// Legality of the transition is deliberately not checked here; the
/// state machine accepts any target status and leaves legality to the
/// caller.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StatusUpdate {
    pub status: JobStatus,
    pub error_message: String,
}

impl StatusUpdate {
    pub fn parse(raw_status: &str, error_message: &str) -> Result<Self> {
        let status = raw_status.parse()?;
        Ok(Self {
            status,
            error_message: error_message.to_string(),
        })
    }

    pub fn new(status: JobStatus, error_message: impl Into<String>) -> Self {
        Self {
            status,
            error_message: error_message.into(),
        }
    }
}

/// The unit of work: one source file reference to be analyzed by the
/// external probe tool, with persistent status.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub modified_at: DateTime<Utc>,
    pub modified_by: String,
    pub src_url: String,
    pub status: JobStatus,
    pub error_msg: String,
    pub tech_info: String,
}

fn job_name(name: &str, created_at: DateTime<Utc>) -> String {
    if name.trim().is_empty() {
        format!("new job @ {}", created_at.format("%Y-%m-%d %H:%M:%S"))
    } else {
        name.to_string()
    }
}

impl Job {
    /// Build a new job in `Created` status. Fails with `InvalidInput`
    /// when the source URL is blank or whitespace-only.
    pub fn new(name: &str, src_url: &str) -> Result<Self> {
        if src_url.trim().is_empty() {
            return Err(ProbeError::InvalidInput(
                "job must have a source URL".to_string(),
            ));
        }
        let now = Utc::now();
        Ok(Self {
            id: JobId::new(),
            name: job_name(name, now),
            created_at: now,
            created_by: String::new(),
            modified_at: now,
            modified_by: String::new(),
            src_url: src_url.to_string(),
            status: JobStatus::Created,
            error_msg: String::new(),
            tech_info: String::new(),
        })
    }
}
