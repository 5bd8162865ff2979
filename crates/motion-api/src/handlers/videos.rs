//! Ownership-gated recording access, §6.1. `X-User-Id` arrives as an opaque,
//! pre-verified header — no JWT/session verification happens here, and
//! nothing in this module ever writes a `patient_ownership` row, only reads
//! it (population is out of scope, per the spec).

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use motion_db::{ownership, queries};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const USER_ID_HEADER: &str = "x-user-id";

fn user_id(headers: &HeaderMap) -> ApiResult<&str> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("missing X-User-Id header"))
}

async fn require_ownership(state: &AppState, patient_id: &str, user_id: &str) -> ApiResult<()> {
    let owned = ownership::is_owned_by(&state.db, patient_id, user_id).await?;
    if owned {
        Ok(())
    } else {
        Err(ApiError::not_found(format!("no recordings for patient '{patient_id}'")))
    }
}

#[derive(Serialize)]
pub struct VideoListEntry {
    pub test_id: String,
    pub recording_file: String,
    pub test_date: chrono::DateTime<chrono::Utc>,
}

/// `GET /videos/{patient_id}/{test}`, ownership-gated per §6.1.
pub async fn list_videos(
    State(state): State<AppState>,
    Path((patient_id, test_name)): Path<(String, String)>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<VideoListEntry>>> {
    let user_id = user_id(&headers)?;
    require_ownership(&state, &patient_id, user_id).await?;

    let rows = queries::recordings_for_patient_test(&state.db, &patient_id, &test_name).await?;
    Ok(Json(
        rows.into_iter()
            .map(|r| VideoListEntry {
                test_id: r.test_id,
                recording_file: r.recording_file,
                test_date: r.test_date,
            })
            .collect(),
    ))
}

/// `GET /recordings/{patient_id}/{test_id}`, ownership-gated per §6.1.
/// Streams the MP4 for one session; 404 if the caller doesn't own the
/// patient, the session doesn't exist, or the file is missing from disk
/// (orphaned by a failed `sql_save` finalize step, §4.8 step 8).
pub async fn fetch_recording(
    State(state): State<AppState>,
    Path((patient_id, test_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    match fetch_recording_inner(&state, &patient_id, &test_id, &headers).await {
        Ok(resp) => resp,
        Err(e) => e.into_response(),
    }
}

async fn fetch_recording_inner(
    state: &AppState,
    patient_id: &str,
    test_id: &str,
    headers: &HeaderMap,
) -> ApiResult<Response> {
    let user_id = user_id(headers)?;
    require_ownership(state, patient_id, user_id).await?;

    let row = queries::lookup_session(&state.db, test_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("no session '{test_id}'")))?;

    if row.patient_id != patient_id {
        return Err(ApiError::not_found(format!("no session '{test_id}' for patient '{patient_id}'")));
    }

    let path = std::path::Path::new(state.recordings_dir.as_ref()).join(&row.recording_file);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| ApiError::not_found(format!("recording file missing for session '{test_id}'")))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "video/mp4")],
        Body::from(bytes),
    )
        .into_response())
}
