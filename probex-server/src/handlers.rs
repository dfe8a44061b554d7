//! Job endpoint handlers. Domain errors are translated by
//! [`AppError`](crate::errors::AppError): not-found becomes 404,
//! invalid input 400, everything else 500.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::error;

use probex_core::{JobId, JobResponse, JobResultRequest, JobStatusUpdateRequest, NewJobRequest};

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct ListJobsParams {
    pub status: Option<String>,
}

fn parse_job_id(raw: &str) -> AppResult<JobId> {
    JobId::parse(raw).map_err(|_| AppError::bad_request(format!("job id must be a uuid: {raw}")))
}

pub async fn get_all_jobs(
    State(state): State<AppState>,
    Query(params): Query<ListJobsParams>,
) -> AppResult<Json<Vec<JobResponse>>> {
    let jobs = state.service.list_jobs(params.status.as_deref()).await?;
    Ok(Json(jobs))
}

pub async fn get_job_by_id(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<Json<JobResponse>> {
    let id = parse_job_id(&job_id)?;
    let job = state.service.get_job_by_id(id).await?;
    Ok(Json(job))
}

pub async fn create_job(
    State(state): State<AppState>,
    Json(request): Json<NewJobRequest>,
) -> AppResult<(StatusCode, Json<JobResponse>)> {
    let created = state.service.create_job(request).await.inspect_err(|err| {
        error!(error = %err, "job creation rejected");
    })?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn delete_job_by_id(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> AppResult<StatusCode> {
    let id = parse_job_id(&job_id)?;
    state.service.delete_job_by_id(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Diagnostics: read-only peek at the job the worker would claim
/// next.
pub async fn get_next_job(State(state): State<AppState>) -> AppResult<Json<JobResponse>> {
    let job = state.service.next_job().await?;
    Ok(Json(job))
}

pub async fn update_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Json(request): Json<JobStatusUpdateRequest>,
) -> AppResult<StatusCode> {
    let id = parse_job_id(&job_id)?;
    state.service.update_status(id, request).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_job_result(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    Json(request): Json<JobResultRequest>,
) -> AppResult<StatusCode> {
    let id = parse_job_id(&job_id)?;
    state.service.attach_result(id, &request.tech_info).await?;
    Ok(StatusCode::NO_CONTENT)
}
