use axum::{
    Router,
    routing::{delete, get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Assemble the job API router.
///
/// `/jobs/next` is registered before `/jobs/{job_id}` so the literal
/// segment wins over the id capture.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/jobs", get(handlers::get_all_jobs))
        .route("/jobs", post(handlers::create_job))
        .route("/jobs/next", get(handlers::get_next_job))
        .route("/jobs/{job_id}", get(handlers::get_job_by_id))
        .route("/jobs/{job_id}", delete(handlers::delete_job_by_id))
        .route("/jobs/{job_id}/status", put(handlers::update_job_status))
        .route("/jobs/{job_id}/result", put(handlers::set_job_result))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
