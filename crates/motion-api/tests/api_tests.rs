//! API integration tests: router wiring, health, and the ownership-gated
//! recording surface (§8 scenario 5).

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use motion_api::{create_router, ApiConfig, AppState};
use motion_db::ownership::set_owner;

async fn test_state() -> (tempfile::TempDir, AppState) {
    let dir = tempfile::tempdir().unwrap();
    let config = ApiConfig {
        db_url: format!("sqlite://{}/motion.db", dir.path().display()),
        recordings_dir: dir.path().join("recordings").display().to_string(),
        templates_dir: dir.path().join("templates").display().to_string(),
        ..ApiConfig::default()
    };
    let state = AppState::new(config).await.unwrap();
    (dir, state)
}

#[tokio::test]
async fn health_endpoint_reports_healthy() {
    let (_dir, state) = test_state().await;
    let app = create_router(state, None);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn dtw_health_lists_supported_models() {
    let (_dir, state) = test_state().await;
    let app = create_router(state, None);

    let response = app
        .oneshot(Request::builder().uri("/dtw/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["ok"], true);
    assert_eq!(json["backend"], "sqlite");
    assert_eq!(json["model"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn dtw_tests_is_empty_for_a_fresh_store() {
    let (_dir, state) = test_state().await;
    let app = create_router(state, None);

    let response = app
        .oneshot(Request::builder().uri("/dtw/tests").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn recordings_without_user_id_header_is_rejected() {
    let (_dir, state) = test_state().await;
    let app = create_router(state, None);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/recordings/patient-1/session-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// §8 scenario 5: user A's session belongs to patient P; user B must not be
/// able to fetch it even with a correct `(patient_id, test_id)` pair.
#[tokio::test]
async fn recordings_404_for_a_user_who_does_not_own_the_patient() {
    let (_dir, state) = test_state().await;
    set_owner(&state.db, "patient-p", "user-a").await.unwrap();
    let app = create_router(state, None);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/recordings/patient-p/session-1")
                .header("X-User-Id", "user-b")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn recordings_404_for_the_owner_when_the_session_does_not_exist() {
    let (_dir, state) = test_state().await;
    set_owner(&state.db, "patient-p", "user-a").await.unwrap();
    let app = create_router(state, None);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/recordings/patient-p/no-such-session")
                .header("X-User-Id", "user-a")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn security_headers_are_present_on_every_response() {
    let (_dir, state) = test_state().await;
    let app = create_router(state, None);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let headers = response.headers();
    assert!(headers.contains_key("X-Content-Type-Options"));
    assert!(headers.contains_key("X-Frame-Options"));
    assert!(headers.contains_key("X-Request-ID"));
}
