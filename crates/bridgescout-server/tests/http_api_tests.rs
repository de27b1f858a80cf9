//! Router tests against in-memory state.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use bridgescout::api::EnrichmentService;
use bridgescout::model::{Candidate, EnrichmentStatus};
use bridgescout::progress::ProgressBus;
use bridgescout::queue::MemoryQueue;
use bridgescout::search::RateLimit;
use bridgescout::store::{MemoryStore, Store};
use bridgescout_server::{build_router, AppState, InboundLimiter};

async fn state_with_candidate() -> AppState {
    let store = Arc::new(MemoryStore::new());
    store
        .put_candidate(&Candidate {
            tenant_id: "t1".into(),
            id: "c1".into(),
            linkedin_slug: "jane-doe-12345".into(),
            linkedin_url: "https://www.linkedin.com/in/jane-doe-12345".into(),
            serp_title: "Jane Doe - SWE | LinkedIn".into(),
            serp_snippet: String::new(),
            serp_metadata: None,
            role_type: None,
            enrichment_status: EnrichmentStatus::None,
            last_enriched_at: None,
        })
        .await
        .unwrap();
    let queue = Arc::new(MemoryQueue::new());
    AppState {
        service: Arc::new(EnrichmentService::new(store.clone(), queue.clone())),
        store,
        queue,
        progress: ProgressBus::default(),
        limiter: Arc::new(InboundLimiter::default()),
    }
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn enrich_accepts_and_returns_receipt() {
    let router = build_router(state_with_candidate().await);
    let response = router
        .oneshot(
            Request::post("/v1/enrich")
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{"tenantId": "t1", "candidateId": "c1"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = body_json(response).await;
    assert!(json["sessionId"].as_str().unwrap().starts_with("ses_"));
    assert_eq!(json["sessionId"], json["jobId"]);
}

#[tokio::test]
async fn enrich_unknown_candidate_is_precondition_failed() {
    let router = build_router(state_with_candidate().await);
    let response = router
        .oneshot(
            Request::post("/v1/enrich")
                .header("content-type", "application/json")
                .body(Body::from(
                    r#"{"tenantId": "t1", "candidateId": "ghost"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
    let json = body_json(response).await;
    assert_eq!(json["error"], "precondition_failed");
}

#[tokio::test]
async fn inbound_limiter_returns_429_with_retry_after() {
    let mut state = state_with_candidate().await;
    state.limiter = Arc::new(InboundLimiter::new(RateLimit {
        requests_per_second: 0.1,
        burst_capacity: 1,
    }));
    let router = build_router(state);

    let request = || {
        Request::post("/v1/enrich")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"tenantId": "t1", "candidateId": "c1"}"#))
            .unwrap()
    };

    let first = router.clone().oneshot(request()).await.unwrap();
    assert_eq!(first.status(), StatusCode::ACCEPTED);

    let second = router.oneshot(request()).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(second.headers().contains_key("retry-after"));
}

#[tokio::test]
async fn session_read_round_trips() {
    let state = state_with_candidate().await;
    let router = build_router(state.clone());

    let receipt = state
        .service
        .enrich("t1", "c1", Default::default())
        .await
        .unwrap();

    let response = router
        .clone()
        .oneshot(
            Request::get(format!("/v1/sessions/{}", receipt.session_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "queued");
    assert_eq!(json["candidateId"], "c1");

    let missing = router
        .oneshot(
            Request::get("/v1/sessions/nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reports_queue_depth() {
    let state = state_with_candidate().await;
    let router = build_router(state.clone());
    state
        .service
        .enrich("t1", "c1", Default::default())
        .await
        .unwrap();

    let response = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["queueDepth"], 1);
}

#[tokio::test]
async fn identities_listing_is_empty_before_enrichment() {
    let router = build_router(state_with_candidate().await);
    let response = router
        .oneshot(
            Request::get("/v1/candidates/c1/identities?tenantId=t1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json.as_array().unwrap().len(), 0);
}
