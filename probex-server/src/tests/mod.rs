use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use probex_core::{JobService, MemoryJobStore};

use crate::config::Config;
use crate::routes;
use crate::state::AppState;

fn test_router() -> Router {
    let service = JobService::new(Arc::new(MemoryJobStore::new()));
    let state = AppState::new(service, Arc::new(Config::default()));
    routes::create_router(state)
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn put_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn create_job(router: &Router, name: &str, src_url: &str) -> Value {
    let (status, body) = send(
        router,
        post_json("/jobs", json!({ "name": name, "src_url": src_url })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

#[tokio::test]
async fn create_then_get_round_trip() {
    let router = test_router();
    let created = create_job(&router, "my job", "https://server/path/file.ext").await;
    assert_eq!(created["name"], "my job");
    assert_eq!(created["status"], "created");

    let job_id = created["job_id"].as_str().unwrap();
    let (status, fetched) = send(&router, get(&format!("/jobs/{job_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn create_without_src_url_is_bad_request() {
    let router = test_router();
    let (status, body) = send(&router, post_json("/jobs", json!({ "name": "x" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("source URL")
    );
}

#[tokio::test]
async fn blank_name_is_defaulted() {
    let router = test_router();
    let created = create_job(&router, "", "https://server/file").await;
    assert!(created["name"].as_str().unwrap().starts_with("new job @"));
}

#[tokio::test]
async fn list_jobs_supports_status_filter() {
    let router = test_router();
    create_job(&router, "a", "https://server/a").await;
    create_job(&router, "b", "https://server/b").await;

    let (status, body) = send(&router, get("/jobs")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (status, body) = send(&router, get("/jobs?status=created")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    // Valid status with no matches is a not-found condition.
    let (status, _) = send(&router, get("/jobs?status=failed")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Unparseable status text is rejected, not silently ignored.
    let (status, _) = send(&router, get("/jobs?status=bogus")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_store_list_is_not_found() {
    let router = test_router();
    let (status, _) = send(&router, get("/jobs")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_with_malformed_id_is_bad_request() {
    let router = test_router();
    let (status, _) = send(&router, get("/jobs/not-a-uuid")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_unknown_id_is_not_found() {
    let router = test_router();
    let id = probex_core::JobId::new();
    let (status, _) = send(&router, get(&format!("/jobs/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_removes_job() {
    let router = test_router();
    let created = create_job(&router, "a", "https://server/a").await;
    let job_id = created["job_id"].as_str().unwrap();

    let (status, _) = send(&router, delete(&format!("/jobs/{job_id}"))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&router, get(&format!("/jobs/{job_id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&router, delete(&format!("/jobs/{job_id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(
        body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("does not exist")
    );
}

#[tokio::test]
async fn next_job_reports_earliest_created() {
    let router = test_router();
    let first = create_job(&router, "first", "https://server/first").await;
    create_job(&router, "second", "https://server/second").await;

    let (status, next) = send(&router, get("/jobs/next")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(next["job_id"], first["job_id"]);

    // Peeking does not claim; the same job comes back.
    let (_, again) = send(&router, get("/jobs/next")).await;
    assert_eq!(again["job_id"], first["job_id"]);
}

#[tokio::test]
async fn next_job_on_empty_queue_is_not_found() {
    let router = test_router();
    let (status, _) = send(&router, get("/jobs/next")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn status_update_endpoint_validates_status_text() {
    let router = test_router();
    let created = create_job(&router, "a", "https://server/a").await;
    let job_id = created["job_id"].as_str().unwrap();

    let (status, _) = send(
        &router,
        put_json(
            &format!("/jobs/{job_id}/status"),
            json!({ "status": "not_a_status" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Record untouched by the rejected update.
    let (_, fetched) = send(&router, get(&format!("/jobs/{job_id}"))).await;
    assert_eq!(fetched["status"], "created");

    let (status, _) = send(
        &router,
        put_json(
            &format!("/jobs/{job_id}/status"),
            json!({ "status": "failed", "error_msg": "operator reset" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, fetched) = send(&router, get(&format!("/jobs/{job_id}"))).await;
    assert_eq!(fetched["status"], "failed");
    assert_eq!(fetched["error_msg"], "operator reset");
}

#[tokio::test]
async fn result_endpoint_attaches_tech_info() {
    let router = test_router();
    let created = create_job(&router, "a", "https://server/a").await;
    let job_id = created["job_id"].as_str().unwrap();

    let (status, _) = send(
        &router,
        put_json(
            &format!("/jobs/{job_id}/result"),
            json!({ "tech_info": "{\"format\":{}}" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, fetched) = send(&router, get(&format!("/jobs/{job_id}"))).await;
    assert_eq!(fetched["tech_info"], "{\"format\":{}}");
}

#[tokio::test]
async fn status_update_on_unknown_job_is_not_found() {
    let router = test_router();
    let id = probex_core::JobId::new();
    let (status, body) = send(
        &router,
        put_json(&format!("/jobs/{id}/status"), json!({ "status": "queued" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(
        body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("does not exist")
    );
}
