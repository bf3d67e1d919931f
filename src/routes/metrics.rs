//! Prometheus metrics endpoint
//!
//! Exposes gateway counters in Prometheus format for monitoring.

use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use tracing::debug;

/// Global Prometheus handle for metrics export
static PROMETHEUS_HANDLE: Lazy<PrometheusHandle> = Lazy::new(|| {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    if metrics::set_global_recorder(recorder).is_err() {
        debug!("A global metrics recorder was already installed");
    }
    handle
});

/// Initialize metrics (call once at startup)
pub fn init_metrics() {
    let _ = &*PROMETHEUS_HANDLE;
    register_metrics();
}

fn register_metrics() {
    metrics::describe_counter!(
        "switchyard_requests_total",
        "Total number of model requests processed"
    );
    metrics::describe_counter!(
        "switchyard_auth_rejections_total",
        "Requests rejected by the authentication gate"
    );
    metrics::describe_counter!(
        "switchyard_stream_sessions_total",
        "Streaming translation sessions by direction and outcome"
    );
    metrics::describe_counter!(
        "switchyard_transport_fallbacks_total",
        "Outbound clients that fell back to a direct connection"
    );
}

/// Prometheus metrics endpoint handler
pub async fn prometheus_metrics() -> impl IntoResponse {
    PROMETHEUS_HANDLE.render()
}

/// Record a completed model request
pub fn record_request(route: &str, status: u16) {
    metrics::counter!(
        "switchyard_requests_total",
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record an authentication rejection
pub fn record_auth_rejection(mode: &str) {
    metrics::counter!("switchyard_auth_rejections_total", "mode" => mode.to_string()).increment(1);
}

/// Record the end of a streaming session
pub fn record_stream_session(direction: &str, outcome: &str) {
    metrics::counter!(
        "switchyard_stream_sessions_total",
        "direction" => direction.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record a proxy that could not be used
pub fn record_transport_fallback() {
    metrics::counter!("switchyard_transport_fallbacks_total").increment(1);
}
