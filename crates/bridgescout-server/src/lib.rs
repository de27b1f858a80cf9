//! # BridgeScout HTTP surface
//!
//! Axum router exposing the enqueue API, session reads, the SSE progress
//! stream, `/health` and `/metrics`. All state is injected: the service,
//! the queue (for depth), the progress bus, and the inbound limiter.
//!
//! ```text
//! POST /v1/enrich                      enqueue a full run
//! POST /v1/summarize                   enqueue a summary-only pass
//! GET  /v1/sessions/:id                session record
//! GET  /v1/candidates/:id/sessions     recent sessions for a candidate
//! GET  /v1/sessions/:id/events         SSE progress stream
//! GET  /health                         queue depth + worker status
//! GET  /metrics                        Prometheus text format
//! ```

mod error;
mod limiter;
mod metrics;

pub use error::ApiError;
pub use limiter::InboundLimiter;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::stream::Stream;
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::debug;

use bridgescout::api::{EnrichOptions, EnrichmentService};
use bridgescout::progress::ProgressBus;
use bridgescout::queue::JobQueue;
use bridgescout::store::Store;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<EnrichmentService>,
    pub store: Arc<dyn Store>,
    pub queue: Arc<dyn JobQueue>,
    pub progress: ProgressBus,
    pub limiter: Arc<InboundLimiter>,
}

/// Assemble the router.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/enrich", post(enrich_handler))
        .route("/v1/summarize", post(summarize_handler))
        .route("/v1/sessions/:id", get(get_session_handler))
        .route("/v1/candidates/:id/sessions", get(recent_sessions_handler))
        .route(
            "/v1/candidates/:id/identities",
            get(list_identities_handler),
        )
        .route("/v1/sessions/:id/events", get(events_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnqueueRequest {
    tenant_id: String,
    candidate_id: String,
    #[serde(flatten)]
    options: EnrichOptions,
}

async fn enrich_handler(
    State(state): State<AppState>,
    Json(request): Json<EnqueueRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.limiter.check(&request.tenant_id) {
        metrics::API_RATE_LIMITED_TOTAL
            .with_label_values(&["enrich"])
            .inc();
        return Err(ApiError::rate_limited(limiter::RETRY_AFTER_SECS));
    }
    let receipt = state
        .service
        .enrich(&request.tenant_id, &request.candidate_id, request.options)
        .await
        .map_err(|e| {
            metrics::API_REQUESTS_TOTAL
                .with_label_values(&["enrich", "error"])
                .inc();
            ApiError::from(e)
        })?;
    metrics::API_REQUESTS_TOTAL
        .with_label_values(&["enrich", "ok"])
        .inc();
    Ok((StatusCode::ACCEPTED, Json(receipt)))
}

async fn summarize_handler(
    State(state): State<AppState>,
    Json(request): Json<EnqueueRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.limiter.check(&request.tenant_id) {
        metrics::API_RATE_LIMITED_TOTAL
            .with_label_values(&["summarize"])
            .inc();
        return Err(ApiError::rate_limited(limiter::RETRY_AFTER_SECS));
    }
    let receipt = state
        .service
        .summarize(&request.tenant_id, &request.candidate_id)
        .await?;
    metrics::API_REQUESTS_TOTAL
        .with_label_values(&["summarize", "ok"])
        .inc();
    Ok((StatusCode::ACCEPTED, Json(receipt)))
}

async fn get_session_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let session = state
        .service
        .get_session(&session_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("session {session_id} not found")))?;
    Ok(Json(session))
}

#[derive(Debug, Deserialize)]
struct RecentQuery {
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    10
}

async fn recent_sessions_handler(
    State(state): State<AppState>,
    Path(candidate_id): Path<String>,
    Query(query): Query<RecentQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let sessions = state
        .service
        .recent_sessions(&candidate_id, query.limit.min(100))
        .await?;
    Ok(Json(sessions))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TenantQuery {
    tenant_id: String,
}

async fn list_identities_handler(
    State(state): State<AppState>,
    Path(candidate_id): Path<String>,
    Query(query): Query<TenantQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut identities = state
        .store
        .list_identities(&query.tenant_id, &candidate_id)
        .await?;
    bridgescout::pipeline::sort_identities(&mut identities);
    Ok(Json(identities))
}

/// SSE progress stream, filtered to one session.
async fn events_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.progress.subscribe();
    let stream = BroadcastStream::new(receiver).filter_map(move |item| match item {
        Ok(event) if event.session_id == session_id => {
            let payload = serde_json::to_string(&event).ok()?;
            Some(Ok(Event::default().event("progress").data(payload)))
        }
        Ok(_) => None,
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            debug!(skipped, "SSE subscriber lagged");
            None
        }
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let depth = state.queue.depth().await.unwrap_or(0);
    metrics::QUEUE_DEPTH.set(depth as f64);
    Json(serde_json::json!({
        "status": "ok",
        "queueDepth": depth,
    }))
}

async fn metrics_handler() -> impl IntoResponse {
    match metrics::gather() {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("failed to gather metrics: {e}"),
        ),
    }
}
