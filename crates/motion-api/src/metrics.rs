//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "motion_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "motion_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "motion_http_requests_in_flight";

    // WebSocket / session metrics
    pub const WS_CONNECTIONS_TOTAL: &str = "motion_ws_connections_total";
    pub const SESSIONS_ACTIVE: &str = "motion_sessions_active";
    pub const WS_MESSAGES_SENT: &str = "motion_ws_messages_sent_total";
    pub const WS_MESSAGES_RECEIVED: &str = "motion_ws_messages_received_total";
    pub const FRAMES_INGESTED_TOTAL: &str = "motion_frames_ingested_total";
    pub const EXTRACTOR_DROPS_TOTAL: &str = "motion_extractor_drops_total";

    // Scoring/finalize metrics
    pub const DTW_DURATION_SECONDS: &str = "motion_dtw_duration_seconds";
    pub const FINALIZE_DURATION_SECONDS: &str = "motion_finalize_duration_seconds";
    pub const FINALIZE_COMPLETED_TOTAL: &str = "motion_finalize_completed_total";
    pub const FINALIZE_FAILED_TOTAL: &str = "motion_finalize_failed_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "motion_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record WebSocket connection.
pub fn record_ws_connection(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::WS_CONNECTIONS_TOTAL, &labels).increment(1);
}

/// Update active session gauge.
pub fn set_active_sessions(count: i64) {
    gauge!(names::SESSIONS_ACTIVE).set(count as f64);
}

/// Record WebSocket message sent.
pub fn record_ws_message_sent(endpoint: &str, message_type: &str) {
    let labels = [
        ("endpoint", endpoint.to_string()),
        ("type", message_type.to_string()),
    ];
    counter!(names::WS_MESSAGES_SENT, &labels).increment(1);
}

/// Record WebSocket message received.
pub fn record_ws_message_received(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::WS_MESSAGES_RECEIVED, &labels).increment(1);
}

/// Record one ingested frame, per model.
pub fn record_frame_ingested(model: &str) {
    let labels = [("model", model.to_string())];
    counter!(names::FRAMES_INGESTED_TOTAL, &labels).increment(1);
}

/// Record a dropped (no-landmark) frame, per model.
pub fn record_extractor_drop(model: &str) {
    let labels = [("model", model.to_string())];
    counter!(names::EXTRACTOR_DROPS_TOTAL, &labels).increment(1);
}

/// Record one DTW run's wall time, per channel.
pub fn record_dtw_duration(channel: &str, duration_secs: f64) {
    let labels = [("channel", channel.to_string())];
    histogram!(names::DTW_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a full finalize run's wall time.
pub fn record_finalize_duration(duration_secs: f64) {
    histogram!(names::FINALIZE_DURATION_SECONDS).record(duration_secs);
}

/// Record finalize outcome.
pub fn record_finalize_outcome(ok: bool) {
    if ok {
        counter!(names::FINALIZE_COMPLETED_TOTAL).increment(1);
    } else {
        counter!(names::FINALIZE_FAILED_TOTAL).increment(1);
    }
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Sanitize path for metrics labels (remove IDs, etc.).
fn sanitize_path(path: &str) -> String {
    // Normalize session ids after /dtw/sessions/<test>/ first, before the
    // generic UUID/numeric passes below would otherwise eat only one segment.
    let path = regex_lite::Regex::new(r"/dtw/sessions/[a-zA-Z0-9_-]+/[a-zA-Z0-9_-]+")
        .unwrap()
        .replace_all(path, "/dtw/sessions/:test/:sid");
    // Normalize patient/test ids in the recordings surface
    let path = regex_lite::Regex::new(r"/recordings/[a-zA-Z0-9_-]+/[a-zA-Z0-9_-]+")
        .unwrap()
        .replace_all(&path, "/recordings/:patient_id/:test_id");
    // Replace any remaining UUIDs and numeric IDs with placeholders
    let path = regex_lite::Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}")
        .unwrap()
        .replace_all(&path, ":id");
    let path = regex_lite::Regex::new(r"/[0-9]+(/|$)")
        .unwrap()
        .replace_all(&path, "/:id$1");
    path.to_string()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    // Increment in-flight counter
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    // Decrement in-flight counter
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
