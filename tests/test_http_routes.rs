
use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use htcondor_apid::api::config_dto::ExecutablesDto;
use htcondor_apid::domain::backend::snapshot::SnapshotBackend;
use htcondor_apid::domain::translator::QueryTranslator;
use htcondor_apid::server::router;
use regex::Regex;
use runner_mock::{MockRunner, cli_backend, cli_backend_with};
use serde_json::{Value, json};
use tower::ServiceExt;

const SNAPSHOT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/pool_snapshot.json");

fn snapshot_app() -> Router {
    let backend = SnapshotBackend::load(SNAPSHOT).unwrap();
    router(QueryTranslator::new(Arc::new(backend)))
}

fn mock_app(runner: &MockRunner) -> Router {
    router(QueryTranslator::new(Arc::new(cli_backend(runner))))
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let response = app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap()).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = get(app, uri).await;
    (status, serde_json::from_str(&body).unwrap())
}

#[tokio::test]
async fn test_job_attribute_body_is_bare_json_string() {
    let (status, body) = get(snapshot_app(), "/v1/jobs/123/0/cmd").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "\"/usr/bin/sleep\"");
}

#[tokio::test]
async fn test_job_listing() {
    let (status, body) = get_json(snapshot_app(), "/v1/jobs/124?projection=Owner").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"classad": {"clusterid": 124, "owner": "bob", "procid": 0}, "jobid": "124.0"}]));
}

#[tokio::test]
async fn test_history_with_constraint() {
    let (status, body) = get_json(snapshot_app(), "/v1/history?constraint=Owner%20%3D%3D%20%22alice%22&projection=Cmd").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"classad": {"clusterid": 120, "cmd": "/bin/hostname", "procid": 0}, "jobid": "120.0"}]));
}

#[tokio::test]
async fn test_missing_job_is_404_with_message() {
    let (status, body) = get_json(snapshot_app(), "/v1/jobs/999").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()), "Unexpected body {}", body);
}

#[tokio::test]
async fn test_invalid_projection_is_400() {
    let (status, body) = get_json(snapshot_app(), "/v1/jobs?projection=foo%3Bbar").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_invalid_path_attribute_is_400() {
    let (status, _) = get(snapshot_app(), "/v1/status/exec01/foo%3Bbar").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_non_numeric_clusterid_is_400() {
    let (status, body) = get_json(snapshot_app(), "/v1/jobs/abc").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("clusterid"));
}

#[tokio::test]
async fn test_unknown_query_type_is_400() {
    let (status, body) = get_json(snapshot_app(), "/v1/status?query=bogus").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("bogus"));
}

#[tokio::test]
async fn test_unknown_daemon_is_400() {
    let (status, _) = get(snapshot_app(), "/v1/config?daemon=shadow").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_status_by_name() {
    let (status, body) = get_json(snapshot_app(), "/v1/status/slot1@exec01.example.org?projection=State").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"name": "slot1@exec01.example.org", "classad": {"name": "slot1@exec01.example.org", "state": "Claimed"}}]));
}

#[tokio::test]
async fn test_condor_version_looks_like_a_version() {
    let (status, body) = get_json(snapshot_app(), "/v1/config/condor_version").await;

    assert_eq!(status, StatusCode::OK);
    let version = body.as_str().unwrap();
    assert!(Regex::new(r"^\d+\.\d+\.\d+$").unwrap().is_match(version), "Unexpected version {:?}", version);
}

#[tokio::test]
async fn test_config_dump_is_an_object() {
    let (status, body) = get_json(snapshot_app(), "/v1/config?daemon=schedd").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"condor_version": "10.0.2", "max_jobs_running": "10000"}));
}

#[tokio::test]
async fn test_repeated_requests_are_byte_identical() {
    let app = snapshot_app();

    let (_, first) = get(app.clone(), "/v1/status?query=startd").await;
    let (_, second) = get(app, "/v1/status?query=startd").await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_responses_carry_a_request_id() {
    for uri in ["/v1/config/condor_version", "/v1/jobs/999"] {
        let response = snapshot_app().oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap()).await.unwrap();
        let request_id = response.headers().get("x-request-id").and_then(|v| v.to_str().ok()).unwrap_or_default();

        assert_eq!(request_id.len(), 36, "Missing request id on {}", uri);
    }
}

#[tokio::test]
async fn test_unwired_history_is_503() {
    let runner = MockRunner::returning("[]");
    let executables = ExecutablesDto { history: None, ..Default::default() };
    let app = router(QueryTranslator::new(Arc::new(cli_backend_with(executables, &runner))));

    let (status, body) = get_json(app, "/v1/history").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["message"].as_str().unwrap().contains("history"));
    assert!(runner.invocations().is_empty());
}

#[tokio::test]
async fn test_validation_failures_never_reach_the_scheduler() {
    let runner = MockRunner::returning("[]");

    for uri in ["/v1/jobs?projection=foo%3Bbar", "/v1/jobs/1/0/foo%20bar", "/v1/status?query=bogus", "/v1/jobs/-1"] {
        let (status, _) = get(mock_app(&runner), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
    }

    assert!(runner.invocations().is_empty());
}

#[tokio::test]
async fn test_upstream_stderr_is_returned_verbatim() {
    let runner = MockRunner::failing(1, "Error: Couldn't parse constraint expression\n");

    let (status, body) = get_json(mock_app(&runner), "/v1/jobs?constraint=foo%20%3D%3D").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"message": "Error: Couldn't parse constraint expression"}));
    assert_eq!(runner.last_tokens()[3], "true && (foo ==)");
}

#[tokio::test]
async fn test_constraint_cannot_widen_a_job_lookup() {
    let (status, body) = get_json(snapshot_app(), "/v1/jobs/124?constraint=true)%20%7C%7C%20(true&projection=Owner").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("unbalanced"));

    let (status, _) = get(snapshot_app(), "/v1/jobs/124/0/owner?constraint=true)%20%7C%7C%20(true").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = get(snapshot_app(), "/v1/jobs/124/0/owner").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "\"bob\"");
}

#[tokio::test]
async fn test_deeply_nested_constraint_is_rejected() {
    let uri = format!("/v1/jobs?constraint={}{}", "(".repeat(20_000), ")".repeat(20_000));

    let (status, body) = get_json(snapshot_app(), &uri).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("nested deeper"));
}

#[tokio::test]
async fn test_malformed_query_string_gets_json_error() {
    let (status, body) = get(snapshot_app(), "/v1/jobs?projection=Owner&projection=Cmd").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert!(body["message"].as_str().is_some_and(|m| m.contains("projection")), "Unexpected body {}", body);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (status, _) = get(snapshot_app(), "/v2/jobs").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
