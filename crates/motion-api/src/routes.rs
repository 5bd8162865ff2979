//! API routes.

use axum::middleware;
use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::handlers::dtw::{channel_series, diag, download, lookup, series, sessions_for_test, tests};
use crate::handlers::videos::{fetch_recording, list_videos};
use crate::handlers::{dtw_health, health, ready};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, rate_limit_middleware, request_id, request_logging, security_headers, RateLimiterCache};
use crate::state::AppState;
use crate::ws::ws_session;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let dtw_routes = Router::new()
        .route("/dtw/health", get(dtw_health))
        .route("/dtw/diag", get(diag))
        .route("/dtw/tests", get(tests))
        .route("/dtw/sessions/lookup/:sid", get(lookup))
        .route("/dtw/sessions/:test", get(sessions_for_test))
        .route("/dtw/sessions/:test/:sid/series", get(series))
        .route("/dtw/sessions/:test/:sid/channel", get(channel_series))
        .route("/dtw/sessions/:test/:sid/download", get(download));

    let video_routes = Router::new()
        .route("/videos/:patient_id/:test", get(list_videos))
        .route("/recordings/:patient_id/:test_id", get(fetch_recording));

    let rate_limiter = std::sync::Arc::new(RateLimiterCache::new(state.config.rate_limit_rps));

    let api_routes = Router::new()
        .merge(dtw_routes)
        .merge(video_routes)
        .layer(middleware::from_fn_with_state(
            rate_limiter.clone(),
            rate_limit_middleware,
        ));

    let ws_routes = Router::new().route("/ws/session", get(ws_session));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .merge(api_routes)
        .merge(ws_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
