//! Prometheus metrics for the HTTP surface and the funnel.

use prometheus::{
    CounterVec, Encoder, Gauge, Opts, Registry, TextEncoder,
};
use std::sync::LazyLock;

static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Inbound API requests by endpoint and outcome.
pub static API_REQUESTS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let counter = CounterVec::new(
        Opts::new(
            "bridgescout_api_requests_total",
            "Inbound API requests by endpoint and outcome",
        ),
        &["endpoint", "outcome"],
    )
    .unwrap_or_else(|e| panic!("metric definition invalid: {e}"));
    let _ = REGISTRY.register(Box::new(counter.clone()));
    counter
});

/// Inbound requests rejected by the per-tenant limiter.
pub static API_RATE_LIMITED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let counter = CounterVec::new(
        Opts::new(
            "bridgescout_api_rate_limited_total",
            "Inbound requests rejected by the per-tenant limiter",
        ),
        &["endpoint"],
    )
    .unwrap_or_else(|e| panic!("metric definition invalid: {e}"));
    let _ = REGISTRY.register(Box::new(counter.clone()));
    counter
});

/// Current queue depth, refreshed by the health endpoint.
pub static QUEUE_DEPTH: LazyLock<Gauge> = LazyLock::new(|| {
    let gauge = Gauge::new("bridgescout_queue_depth", "Ready and delayed jobs")
        .unwrap_or_else(|e| panic!("metric definition invalid: {e}"));
    let _ = REGISTRY.register(Box::new(gauge.clone()));
    gauge
});

/// Render the registry in the Prometheus text format.
pub fn gather() -> Result<String, prometheus::Error> {
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
