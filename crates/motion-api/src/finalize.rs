//! Finalization (§4.8, spans C3-C8): turns an accepted `end` into a scored,
//! persisted `TestResult`, or reports why it couldn't be.

use std::sync::Arc;

use chrono::Utc;
use ndarray::Array2;

use motion_dtw::{dtw, Band, DtwError};
use motion_features::{amplitude, speed};
use motion_models::test_result::{ChannelResult, TestResult};
use motion_session::FinalizeRequest;

use crate::metrics;
use crate::state::AppState;

/// Why finalization failed, already split along the transport boundary in
/// §7: a `Scoring` failure maps to `dtw_error`; a `Persistence` failure maps
/// to `error{where:"save_mp4"|"sql_save"}`.
#[derive(Debug)]
pub enum FinalizeError {
    Scoring { reason: String, message: String },
    Persistence { where_: &'static str, message: String },
}

/// One computed channel plus the raw series it was built from, so the
/// caller can run DTW against the reference series too.
struct Scored {
    position: ChannelResult,
    amplitude: ChannelResult,
    speed: ChannelResult,
    similarity_overall: f64,
    avg_step_pos: f64,
}

/// Pure CPU work: build the channel matrices, run DTW three times, compute
/// the §4.8 step-6 similarity formula. Safe to run inside
/// `WorkerPool::run_blocking`.
fn score(live: &[Vec<f32>], template: &Array2<f32>, band: Band) -> Result<Scored, DtwError> {
    let t_live = live.len();
    let d_live = live.first().map(|r| r.len()).unwrap_or(0);
    let d_ref = template.ncols();
    if d_live != d_ref {
        return Err(DtwError::DimMismatch { a: d_live, b: d_ref });
    }

    let x = Array2::from_shape_vec(
        (t_live, d_live),
        live.iter().flatten().map(|&v| v as f64).collect(),
    )
    .expect("live matrix shape matches row/col counts computed above");
    let y = template.mapv(|v| v as f64);

    let pos = channel_result(x.view(), y.view(), band)?;

    let ax = amplitude(&x);
    let ay = amplitude(&y);
    let amp = channel_result(
        Array2::from_shape_vec((ax.len(), 1), ax).unwrap().view(),
        Array2::from_shape_vec((ay.len(), 1), ay).unwrap().view(),
        band,
    )?;

    let sx = speed(&x);
    let sy = speed(&y);
    let spd = channel_result(
        Array2::from_shape_vec((sx.len(), 1), sx).unwrap().view(),
        Array2::from_shape_vec((sy.len(), 1), sy).unwrap().view(),
        band,
    )?;

    let similarity_overall = (pos.similarity + amp.similarity + spd.similarity) / 3.0;
    let avg_step_pos = pos.distance / (pos.local_costs.len().max(1) as f64);

    Ok(Scored {
        position: pos,
        amplitude: amp,
        speed: spd,
        similarity_overall,
        avg_step_pos,
    })
}

/// Small positive constant guarding every division in the similarity
/// formula (§4.8 step 6), independent of the extractor's own `EPS`.
const EPS: f64 = 1e-6;

fn channel_result(
    x: ndarray::ArrayView2<f64>,
    y: ndarray::ArrayView2<f64>,
    band: Band,
) -> Result<ChannelResult, DtwError> {
    let outcome = dtw(x, y, band)?;
    let aligned_ref_by_live = motion_dtw::aligned_ref_by_live(&outcome.path, x.nrows());

    let r = y
        .rows()
        .into_iter()
        .flat_map(|row| row.to_vec())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    let r = (r.1 - r.0).max(0.0);
    let l = 0.5 * (x.nrows() as f64 + y.nrows() as f64);

    let similarity = 1.0 / (1.0 + outcome.total / (l * r.max(EPS)).max(EPS));

    Ok(ChannelResult {
        distance: outcome.total,
        similarity,
        r,
        l,
        local_costs: outcome.local_costs,
        aligned_ref_by_live,
    })
}

/// Runs scoring on the worker pool, encodes the recording, and persists the
/// result — the full C3-C8 pipeline behind one `end`.
pub async fn run_finalize(state: &AppState, req: FinalizeRequest) -> Result<TestResult, FinalizeError> {
    let start = std::time::Instant::now();
    let band = req.sakoe_radius.map(sakoe_to_band).unwrap_or(state.config.default_band);

    let feature_buffer = req.feature_buffer;
    let template = Arc::clone(&req.template);
    let frame_count = feature_buffer.len() as i64;

    let scored = state
        .worker
        .run_blocking(move || score(&feature_buffer, &template, band))
        .await
        .map_err(|e| FinalizeError::Scoring {
            reason: "WorkerPanicked".to_string(),
            message: e.to_string(),
        })?
        .map_err(|e| FinalizeError::Scoring {
            reason: dtw_error_reason(&e).to_string(),
            message: e.to_string(),
        })?;

    let recording_file = motion_media::write_mp4(
        state.recordings_dir.as_ref(),
        &req.test_id,
        &req.frame_buffer,
        req.fps_hint,
    )
    .await
    .map_err(|e| FinalizeError::Persistence {
        where_: "save_mp4",
        message: e.to_string(),
    })?;

    let result = TestResult {
        test_id: req.test_id.clone(),
        patient_id: req.patient_id,
        test_name: req.test_name,
        model: req.model.as_str().to_string(),
        test_date: Utc::now(),
        fps: req.fps_hint.unwrap_or(30.0),
        recording_file,
        frame_count,
        similarity_overall: scored.similarity_overall,
        avg_step_pos: scored.avg_step_pos,
        position: scored.position,
        amplitude: scored.amplitude,
        speed: scored.speed,
    };

    motion_db::insert_test_result(&state.db, &result)
        .await
        .map_err(|e| FinalizeError::Persistence {
            where_: "sql_save",
            message: e.to_string(),
        })?;

    metrics::record_finalize_duration(start.elapsed().as_secs_f64());
    metrics::record_finalize_outcome(true);

    Ok(result)
}

fn sakoe_to_band(radius: motion_models::SakoeRadius) -> Band {
    match radius {
        motion_models::SakoeRadius::Auto(_) => Band::Auto,
        motion_models::SakoeRadius::Fixed(r) => Band::Fixed(r),
    }
}

fn dtw_error_reason(e: &DtwError) -> &'static str {
    match e {
        DtwError::DimMismatch { .. } => "DimMismatch",
        DtwError::EmptySequence => "EmptySequence",
        DtwError::BandInfeasible => "BandInfeasible",
    }
}
