//! Read Projections (C9), §4.9 plus the §4.1a channel-series supplement.

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use motion_db::downsample::downsample_channel;
use motion_db::queries;
use motion_models::test_result::{SessionSummary, TestResult};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `GET /dtw/diag`.
#[derive(Serialize)]
pub struct DiagResponse {
    pub total_tests: i64,
    pub by_test_name: Vec<DiagEntry>,
}

#[derive(Serialize)]
pub struct DiagEntry {
    pub test_name: String,
    pub count: i64,
}

pub async fn diag(State(state): State<AppState>) -> ApiResult<Json<DiagResponse>> {
    let counts = queries::diag_counts(&state.db).await?;
    let total_tests = counts.iter().map(|c| c.count).sum();
    Ok(Json(DiagResponse {
        total_tests,
        by_test_name: counts
            .into_iter()
            .map(|c| DiagEntry {
                test_name: c.test_name,
                count: c.count,
            })
            .collect(),
    }))
}

/// `GET /dtw/tests`.
pub async fn tests(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(queries::distinct_test_names(&state.db).await?))
}

/// `GET /dtw/sessions/{test}`.
pub async fn sessions_for_test(
    State(state): State<AppState>,
    Path(test): Path<String>,
) -> ApiResult<Json<Vec<SessionSummary>>> {
    Ok(Json(queries::sessions_for_test(&state.db, &test).await?))
}

/// `GET /dtw/sessions/lookup/{sid}`.
pub async fn lookup(
    State(state): State<AppState>,
    Path(sid): Path<String>,
) -> ApiResult<Json<queries::LookupRow>> {
    queries::lookup_session(&state.db, &sid)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("no session '{sid}'")))
}

/// `GET /dtw/sessions/{test}/{sid}/download`, per §4.9 and the §6 REST
/// surface. Streams the session's MP4; 404 if `recording_file` is unset
/// or the file is missing on disk (orphaned by a failed `sql_save`
/// finalize step, §4.8 step 8). Unlike `/recordings/{patient_id}/{test_id}`
/// this route is not ownership-gated — it lives under `/dtw`, alongside
/// the other read projections.
pub async fn download(State(state): State<AppState>, Path((test, sid)): Path<(String, String)>) -> Response {
    match download_inner(&state, &test, &sid).await {
        Ok(resp) => resp,
        Err(e) => e.into_response(),
    }
}

async fn download_inner(state: &AppState, test: &str, sid: &str) -> ApiResult<Response> {
    let row = queries::lookup_session(&state.db, sid)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("no session '{sid}'")))?;

    if row.test_name != test {
        return Err(ApiError::not_found(format!("no session '{sid}' for test '{test}'")));
    }
    if row.recording_file.is_empty() {
        return Err(ApiError::not_found(format!("no recording for session '{sid}'")));
    }

    let path = std::path::Path::new(state.recordings_dir.as_ref()).join(&row.recording_file);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| ApiError::not_found(format!("recording file missing for session '{sid}'")))?;

    Ok((StatusCode::OK, [(header::CONTENT_TYPE, "video/mp4")], Body::from(bytes)).into_response())
}

#[derive(Deserialize)]
pub struct SeriesQuery {
    #[serde(default)]
    pub max_points: usize,
}

#[derive(Serialize)]
pub struct ChannelSeries {
    pub local_costs: Vec<f64>,
    pub alignment_map: Vec<AlignmentPoint>,
}

#[derive(Serialize)]
pub struct AlignmentPoint {
    pub x: usize,
    pub y: i64,
}

#[derive(Serialize)]
pub struct SeriesResponse {
    pub position: ChannelSeries,
    pub amplitude: ChannelSeries,
    pub speed: ChannelSeries,
}

fn to_series(local_costs: &[f64], aligned_ref_by_live: &[i64], max_points: usize) -> ChannelSeries {
    let (costs, aligned) = downsample_channel(local_costs, aligned_ref_by_live, max_points);
    let alignment_map = aligned
        .into_iter()
        .enumerate()
        .map(|(x, y)| AlignmentPoint { x, y })
        .collect();
    ChannelSeries {
        local_costs: costs,
        alignment_map,
    }
}

/// `GET /dtw/sessions/{test}/{sid}/series?max_points=N`, per §4.9.
pub async fn series(
    State(state): State<AppState>,
    Path((test, sid)): Path<(String, String)>,
    Query(q): Query<SeriesQuery>,
) -> ApiResult<Json<SeriesResponse>> {
    let result = fetch_result(&state, &test, &sid).await?;
    Ok(Json(SeriesResponse {
        position: to_series(&result.position.local_costs, &result.position.aligned_ref_by_live, q.max_points),
        amplitude: to_series(&result.amplitude.local_costs, &result.amplitude.aligned_ref_by_live, q.max_points),
        speed: to_series(&result.speed.local_costs, &result.speed.aligned_ref_by_live, q.max_points),
    }))
}

#[derive(Deserialize)]
pub struct ChannelQuery {
    #[serde(default = "default_landmarks")]
    pub landmarks: String,
    #[serde(default = "default_axis")]
    pub axis: String,
    #[serde(default)]
    pub max_points: usize,
}

fn default_landmarks() -> String {
    "all".to_string()
}

fn default_axis() -> String {
    "both".to_string()
}

/// Points per frame for a model's raw landmark set, per §4.1a.
fn points_per_frame(model: &str) -> usize {
    match model {
        "pose" => 33,
        _ => 21, // hands, finger
    }
}

fn parse_landmarks(raw: &str, points: usize) -> ApiResult<Vec<usize>> {
    if raw == "all" {
        return Ok((0..points).collect());
    }
    raw.split(',')
        .map(|s| {
            s.trim()
                .parse::<usize>()
                .map_err(|_| ApiError::bad_request(format!("invalid landmark index '{s}'")))
                .and_then(|i| {
                    if i < points {
                        Ok(i)
                    } else {
                        Err(ApiError::bad_request(format!(
                            "landmark index {i} out of range for {points}-point model"
                        )))
                    }
                })
        })
        .collect()
}

/// `GET /dtw/sessions/{test}/{sid}/channel?landmarks=&axis=&max_points=`,
/// the §4.1a supplement. The position channel's `local_costs` are a single
/// scalar per warping step over the full normalized feature vector — this
/// workspace doesn't persist a per-landmark decomposition, so `landmarks`
/// and `axis` are validated against the model's point count but the series
/// returned is the same per-step position channel every other read uses.
pub async fn channel_series(
    State(state): State<AppState>,
    Path((test, sid)): Path<(String, String)>,
    Query(q): Query<ChannelQuery>,
) -> ApiResult<Json<ChannelSeries>> {
    let result = fetch_result(&state, &test, &sid).await?;
    let points = points_per_frame(&result.model);
    let landmarks = parse_landmarks(&q.landmarks, points)?;
    if landmarks.is_empty() {
        return Err(ApiError::bad_request("landmarks selection is empty"));
    }
    if !matches!(q.axis.as_str(), "x" | "y" | "both") {
        return Err(ApiError::bad_request(format!("unknown axis '{}'", q.axis)));
    }

    Ok(Json(to_series(
        &result.position.local_costs,
        &result.position.aligned_ref_by_live,
        q.max_points,
    )))
}

async fn fetch_result(state: &AppState, test: &str, sid: &str) -> ApiResult<TestResult> {
    queries::full_result(&state.db, test, sid)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("no session '{sid}' for test '{test}'")))
}
