//! Result Store (C8): the single write path for a finalized session's
//! `TestResult`.

use motion_models::test_result::TestResult;
use sqlx::SqlitePool;

use crate::error::DbResultT;

/// Inserts a finalized `TestResult` as one atomic row. `test_id` is the
/// primary key, so re-finalizing the same session replaces its prior row.
pub async fn insert_test_result(pool: &SqlitePool, result: &TestResult) -> DbResultT<()> {
    let pos_local_costs = serde_json::to_string(&result.position.local_costs)?;
    let pos_aligned = serde_json::to_string(&result.position.aligned_ref_by_live)?;
    let amp_local_costs = serde_json::to_string(&result.amplitude.local_costs)?;
    let amp_aligned = serde_json::to_string(&result.amplitude.aligned_ref_by_live)?;
    let spd_local_costs = serde_json::to_string(&result.speed.local_costs)?;
    let spd_aligned = serde_json::to_string(&result.speed.aligned_ref_by_live)?;

    sqlx::query(
        r#"
        INSERT INTO test_results (
            test_id, patient_id, test_name, model, test_date, fps, recording_file, frame_count,
            distance_pos, similarity_pos, r_pos, l_pos, pos_local_costs, pos_aligned_ref_by_live,
            distance_amp, similarity_amp, r_amp, l_amp, amp_local_costs, amp_aligned_ref_by_live,
            distance_spd, similarity_spd, r_spd, l_spd, spd_local_costs, spd_aligned_ref_by_live,
            similarity_overall, avg_step_pos
        ) VALUES (
            ?, ?, ?, ?, ?, ?, ?, ?,
            ?, ?, ?, ?, ?, ?,
            ?, ?, ?, ?, ?, ?,
            ?, ?, ?, ?, ?, ?,
            ?, ?
        )
        ON CONFLICT(test_id) DO UPDATE SET
            patient_id = excluded.patient_id,
            test_name = excluded.test_name,
            model = excluded.model,
            test_date = excluded.test_date,
            fps = excluded.fps,
            recording_file = excluded.recording_file,
            frame_count = excluded.frame_count,
            distance_pos = excluded.distance_pos,
            similarity_pos = excluded.similarity_pos,
            r_pos = excluded.r_pos,
            l_pos = excluded.l_pos,
            pos_local_costs = excluded.pos_local_costs,
            pos_aligned_ref_by_live = excluded.pos_aligned_ref_by_live,
            distance_amp = excluded.distance_amp,
            similarity_amp = excluded.similarity_amp,
            r_amp = excluded.r_amp,
            l_amp = excluded.l_amp,
            amp_local_costs = excluded.amp_local_costs,
            amp_aligned_ref_by_live = excluded.amp_aligned_ref_by_live,
            distance_spd = excluded.distance_spd,
            similarity_spd = excluded.similarity_spd,
            r_spd = excluded.r_spd,
            l_spd = excluded.l_spd,
            spd_local_costs = excluded.spd_local_costs,
            spd_aligned_ref_by_live = excluded.spd_aligned_ref_by_live,
            similarity_overall = excluded.similarity_overall,
            avg_step_pos = excluded.avg_step_pos
        "#,
    )
    .bind(&result.test_id)
    .bind(&result.patient_id)
    .bind(&result.test_name)
    .bind(&result.model)
    .bind(result.test_date)
    .bind(result.fps)
    .bind(&result.recording_file)
    .bind(result.frame_count)
    .bind(result.position.distance)
    .bind(result.position.similarity)
    .bind(result.position.r)
    .bind(result.position.l)
    .bind(pos_local_costs)
    .bind(pos_aligned)
    .bind(result.amplitude.distance)
    .bind(result.amplitude.similarity)
    .bind(result.amplitude.r)
    .bind(result.amplitude.l)
    .bind(amp_local_costs)
    .bind(amp_aligned)
    .bind(result.speed.distance)
    .bind(result.speed.similarity)
    .bind(result.speed.r)
    .bind(result.speed.l)
    .bind(spd_local_costs)
    .bind(spd_aligned)
    .bind(result.similarity_overall)
    .bind(result.avg_step_pos)
    .execute(pool)
    .await?;

    Ok(())
}
