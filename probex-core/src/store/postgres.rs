//! Postgres-backed job store. Same operation contract as the
//! in-memory store over a `jobs` table; the orchestration service is
//! indifferent to which backend it holds.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use super::{JobStore, not_found_by_id};
use crate::error::{ProbeError, Result};
use crate::job::{Job, JobId, JobStatus, StatusUpdate};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS jobs (
    job_id      UUID PRIMARY KEY,
    name        TEXT NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL,
    created_by  TEXT NOT NULL DEFAULT '',
    modified_at TIMESTAMPTZ NOT NULL,
    modified_by TEXT NOT NULL DEFAULT '',
    src_url     TEXT NOT NULL,
    status      TEXT NOT NULL,
    error_msg   TEXT NOT NULL DEFAULT '',
    tech_info   TEXT NOT NULL DEFAULT ''
)
"#;

#[derive(Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl fmt::Debug for PgJobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgJobStore")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .finish()
    }
}

#[derive(FromRow)]
struct JobRow {
    job_id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
    created_by: String,
    modified_at: DateTime<Utc>,
    modified_by: String,
    src_url: String,
    status: String,
    error_msg: String,
    tech_info: String,
}

impl JobRow {
    fn into_job(self) -> Result<Job> {
        let status: JobStatus = self.status.parse().map_err(|_| {
            ProbeError::Internal(format!(
                "job {} carries unknown status {}",
                self.job_id, self.status
            ))
        })?;
        Ok(Job {
            id: JobId(self.job_id),
            name: self.name,
            created_at: self.created_at,
            created_by: self.created_by,
            modified_at: self.modified_at,
            modified_by: self.modified_by,
            src_url: self.src_url,
            status,
            error_msg: self.error_msg,
            tech_info: self.tech_info,
        })
    }
}

fn db_error(context: &str, err: sqlx::Error) -> ProbeError {
    ProbeError::Internal(format!("{context}: {err}"))
}

impl PgJobStore {
    /// Connect-time health check plus idempotent schema install.
    pub async fn new(pool: PgPool) -> Result<Self> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&pool)
            .await
            .map_err(|e| db_error("job store failed Postgres health check", e))?;
        sqlx::query(SCHEMA)
            .execute(&pool)
            .await
            .map_err(|e| db_error("job table install failed", e))?;
        info!("job store connected to Postgres");
        Ok(Self { pool })
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn find_all(&self, status_filter: Option<JobStatus>) -> Result<Vec<Job>> {
        let rows: Vec<JobRow> = match status_filter {
            None => {
                sqlx::query_as("SELECT * FROM jobs ORDER BY created_at, job_id")
                    .fetch_all(&self.pool)
                    .await
            }
            Some(status) => {
                sqlx::query_as("SELECT * FROM jobs WHERE status = $1 ORDER BY created_at, job_id")
                    .bind(status.as_str())
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(|e| db_error("job list query failed", e))?;

        if rows.is_empty() {
            return Err(match status_filter {
                None => ProbeError::NotFound("no jobs in store".to_string()),
                Some(status) => ProbeError::NotFound(format!("no jobs with status {status}")),
            });
        }
        rows.into_iter().map(JobRow::into_job).collect()
    }

    async fn find_by_id(&self, id: JobId) -> Result<Job> {
        let row: Option<JobRow> = sqlx::query_as("SELECT * FROM jobs WHERE job_id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("job lookup failed", e))?;
        row.ok_or_else(|| not_found_by_id(id))?.into_job()
    }

    async fn save(&self, job: Job) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO jobs
                (job_id, name, created_at, created_by, modified_at, modified_by,
                 src_url, status, error_msg, tech_info)
            VALUES ($1, $2, $3, $4, NOW(), $5, $6, $7, $8, $9)
            ON CONFLICT (job_id) DO UPDATE SET
                name = EXCLUDED.name,
                modified_at = GREATEST(NOW(), jobs.modified_at),
                modified_by = EXCLUDED.modified_by,
                src_url = EXCLUDED.src_url,
                status = EXCLUDED.status,
                error_msg = EXCLUDED.error_msg,
                tech_info = EXCLUDED.tech_info
            "#,
        )
        .bind(job.id.0)
        .bind(&job.name)
        .bind(job.created_at)
        .bind(&job.created_by)
        .bind(&job.modified_by)
        .bind(&job.src_url)
        .bind(job.status.as_str())
        .bind(&job.error_msg)
        .bind(&job.tech_info)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("job save failed", e))?;
        Ok(())
    }

    async fn delete_by_id(&self, id: JobId) -> Result<()> {
        let result = sqlx::query("DELETE FROM jobs WHERE job_id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("job delete failed", e))?;
        if result.rows_affected() == 0 {
            return Err(not_found_by_id(id));
        }
        Ok(())
    }

    async fn get_next(&self) -> Result<Job> {
        let row: Option<JobRow> = sqlx::query_as(
            "SELECT * FROM jobs WHERE status = 'created' ORDER BY created_at, job_id LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("next job query failed", e))?;
        row.ok_or_else(|| ProbeError::NotFound("no job waiting to be processed".to_string()))?
            .into_job()
    }

    async fn claim_next(&self) -> Result<Job> {
        // Single statement so the select and the status flip cannot be
        // split by a concurrent claimer.
        let row: Option<JobRow> = sqlx::query_as(
            r#"
            UPDATE jobs SET status = 'running', error_msg = '',
                   modified_at = GREATEST(NOW(), modified_at)
            WHERE job_id = (
                SELECT job_id FROM jobs
                WHERE status = 'created'
                ORDER BY created_at, job_id
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING *
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("job claim failed", e))?;
        row.ok_or_else(|| ProbeError::NotFound("no job waiting to be processed".to_string()))?
            .into_job()
    }

    async fn set_status(&self, id: JobId, update: StatusUpdate) -> Result<()> {
        let error_msg = if update.status == JobStatus::Failed {
            update.error_message.as_str()
        } else {
            ""
        };
        let result = sqlx::query(
            r#"
            UPDATE jobs SET status = $2, error_msg = $3,
                   modified_at = GREATEST(NOW(), modified_at)
            WHERE job_id = $1
            "#,
        )
        .bind(id.0)
        .bind(update.status.as_str())
        .bind(error_msg)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("job status update failed", e))?;
        if result.rows_affected() == 0 {
            return Err(not_found_by_id(id));
        }
        Ok(())
    }

    async fn set_result(&self, id: JobId, tech_info: &str) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE jobs SET tech_info = $2,
                   modified_at = GREATEST(NOW(), modified_at)
            WHERE job_id = $1
            "#,
        )
        .bind(id.0)
        .bind(tech_info)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("job result update failed", e))?;
        if result.rows_affected() == 0 {
            return Err(not_found_by_id(id));
        }
        Ok(())
    }
}
