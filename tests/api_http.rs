// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - POST /match/interactive/start (needs_more and ready branches)
// - POST /match/interactive/finalize (empty candidate set)
// - POST /backlog/ingest -> 204 No Content

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value as Json};
use tower::ServiceExt as _;

use marketplace_matcher::api::{self, AppState};
use marketplace_matcher::backlog_writer::mock::MockBacklogStore;
use marketplace_matcher::catalog::MockCatalogRepository;
use marketplace_matcher::domain::RequirementDelta;
use marketplace_matcher::llm::MockLlmGateway;
use marketplace_matcher::validator::Thresholds;

const BODY_LIMIT: usize = 1024 * 1024;

fn test_router(gateway: MockLlmGateway, catalog: MockCatalogRepository) -> Router {
    let state = AppState {
        gateway: Arc::new(gateway),
        catalog: Arc::new(catalog),
        backlog_store: Arc::new(MockBacklogStore::default()),
        thresholds: Thresholds::default(),
        deadline: Duration::from_secs(5),
    };
    api::router(state)
}

async fn json_body(resp: axum::response::Response) -> Json {
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn api_health_returns_200() {
    let app = test_router(MockLlmGateway::default(), MockCatalogRepository::default());
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn api_start_rejects_short_prompt_with_400() {
    let app = test_router(MockLlmGateway::default(), MockCatalogRepository::default());
    let req = Request::builder()
        .method("POST")
        .uri("/match/interactive/start")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "prompt_text": "short" }).to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn api_start_returns_needs_more_when_underspecified() {
    let gateway = MockLlmGateway::with_extractions(vec![RequirementDelta {
        labels: vec!["CRM".to_string()],
        ..Default::default()
    }]);
    let app = test_router(gateway, MockCatalogRepository::default());
    let req = Request::builder()
        .method("POST")
        .uri("/match/interactive/start")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "prompt_text": "I need a tool to manage my projects" }).to_string(),
        ))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["status"], "needs_more");
    assert!(body["question"].is_string());
}

#[tokio::test]
async fn api_finalize_returns_empty_results_for_empty_candidates() {
    let app = test_router(MockLlmGateway::default(), MockCatalogRepository::default());
    let session = json!({
        "turns": [{"role": "user", "text": "A full requirement statement about CRM tooling."}],
        "accumulated": {
            "labels": {"items": ["CRM", "Analytics"]},
            "tags": {"items": ["B2B"]},
            "integrations": {"items": ["Stripe"]},
            "price_max": null
        },
        "missing": {"labels_needed": 0, "tags_needed": 0, "integrations_needed": 0},
        "is_valid": true
    });
    let req = Request::builder()
        .method("POST")
        .uri("/match/interactive/finalize")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "session": session }).to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["results"], json!([]));
}

#[tokio::test]
async fn api_backlog_ingest_returns_204() {
    let app = test_router(MockLlmGateway::default(), MockCatalogRepository::default());
    let req = Request::builder()
        .method("POST")
        .uri("/backlog/ingest")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "prompt_text": "I need Stripe billing integration" }).to_string(),
        ))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}
