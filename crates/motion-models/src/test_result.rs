//! The persisted outcome of one finalized session (§3 `TestResult`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-channel DTW scalars and series, c ∈ {pos, amp, spd}.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChannelResult {
    pub distance: f64,
    pub similarity: f64,
    pub r: f64,
    pub l: f64,
    /// `local_costs[k]` for each step `k` of the warping path.
    pub local_costs: Vec<f64>,
    /// `aligned_ref_by_live[i]` = chosen reference index for live index `i`.
    pub aligned_ref_by_live: Vec<i64>,
}

/// One row of the TestResult table: the immutable outcome of finalization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestResult {
    pub test_id: String,
    pub patient_id: String,
    pub test_name: String,
    pub model: String,
    pub test_date: DateTime<Utc>,
    pub fps: f64,
    pub recording_file: String,
    pub frame_count: i64,
    pub similarity_overall: f64,
    pub avg_step_pos: f64,
    pub position: ChannelResult,
    pub amplitude: ChannelResult,
    pub speed: ChannelResult,
}

/// Summary row returned by `GET /dtw/sessions/{test}` — scalars only, no
/// series, matching the original `dtw_rest.py` session-list projection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSummary {
    pub session_id: String,
    pub patient_id: String,
    pub test_name: String,
    pub test_date: DateTime<Utc>,
    pub model: String,
    pub frame_count: i64,
    pub similarity_overall: f64,
    pub distance_pos: f64,
}
