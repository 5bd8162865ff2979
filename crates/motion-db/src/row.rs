//! `test_results` row <-> `motion_models::TestResult` conversion.
//!
//! The three DTW channels are flattened into prefixed columns (`pos_*`,
//! `amp_*`, `spd_*`) and their series fields are stored as JSON TEXT, since
//! SQLite has no native array type.

use chrono::{DateTime, Utc};
use motion_models::test_result::{ChannelResult, SessionSummary, TestResult};
use sqlx::FromRow;

use crate::error::DbResultT;

/// `FromRow` counterpart of `motion_models::SessionSummary` — kept local so
/// `motion-models` doesn't need to depend on sqlx.
#[derive(Debug, FromRow)]
pub(crate) struct SessionSummaryRow {
    pub session_id: String,
    pub patient_id: String,
    pub test_name: String,
    pub test_date: DateTime<Utc>,
    pub model: String,
    pub frame_count: i64,
    pub similarity_overall: f64,
    pub distance_pos: f64,
}

impl SessionSummaryRow {
    pub(crate) fn into_summary(self) -> SessionSummary {
        SessionSummary {
            session_id: self.session_id,
            patient_id: self.patient_id,
            test_name: self.test_name,
            test_date: self.test_date,
            model: self.model,
            frame_count: self.frame_count,
            similarity_overall: self.similarity_overall,
            distance_pos: self.distance_pos,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct TestResultRow {
    pub test_id: String,
    pub patient_id: String,
    pub test_name: String,
    pub model: String,
    pub test_date: DateTime<Utc>,
    pub fps: f64,
    pub recording_file: String,
    pub frame_count: i64,

    pub distance_pos: f64,
    pub similarity_pos: f64,
    pub r_pos: f64,
    pub l_pos: f64,
    pub pos_local_costs: String,
    pub pos_aligned_ref_by_live: String,

    pub distance_amp: f64,
    pub similarity_amp: f64,
    pub r_amp: f64,
    pub l_amp: f64,
    pub amp_local_costs: String,
    pub amp_aligned_ref_by_live: String,

    pub distance_spd: f64,
    pub similarity_spd: f64,
    pub r_spd: f64,
    pub l_spd: f64,
    pub spd_local_costs: String,
    pub spd_aligned_ref_by_live: String,

    pub similarity_overall: f64,
    pub avg_step_pos: f64,
}

impl TestResultRow {
    pub(crate) fn into_test_result(self) -> DbResultT<TestResult> {
        Ok(TestResult {
            test_id: self.test_id,
            patient_id: self.patient_id,
            test_name: self.test_name,
            model: self.model,
            test_date: self.test_date,
            fps: self.fps,
            recording_file: self.recording_file,
            frame_count: self.frame_count,
            similarity_overall: self.similarity_overall,
            avg_step_pos: self.avg_step_pos,
            position: ChannelResult {
                distance: self.distance_pos,
                similarity: self.similarity_pos,
                r: self.r_pos,
                l: self.l_pos,
                local_costs: serde_json::from_str(&self.pos_local_costs)?,
                aligned_ref_by_live: serde_json::from_str(&self.pos_aligned_ref_by_live)?,
            },
            amplitude: ChannelResult {
                distance: self.distance_amp,
                similarity: self.similarity_amp,
                r: self.r_amp,
                l: self.l_amp,
                local_costs: serde_json::from_str(&self.amp_local_costs)?,
                aligned_ref_by_live: serde_json::from_str(&self.amp_aligned_ref_by_live)?,
            },
            speed: ChannelResult {
                distance: self.distance_spd,
                similarity: self.similarity_spd,
                r: self.r_spd,
                l: self.l_spd,
                local_costs: serde_json::from_str(&self.spd_local_costs)?,
                aligned_ref_by_live: serde_json::from_str(&self.spd_aligned_ref_by_live)?,
            },
        })
    }
}
