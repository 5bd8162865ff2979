//! Read projections (C9): everything `/dtw/*` needs besides the raw write
//! path in [`crate::store`].

use chrono::{DateTime, Utc};
use motion_models::test_result::{SessionSummary, TestResult};
use sqlx::{FromRow, SqlitePool};

use crate::error::DbResultT;
use crate::row::{SessionSummaryRow, TestResultRow};

/// Row returned by session-id lookup, independent of `test_name`.
#[derive(Debug, FromRow)]
pub struct LookupRow {
    pub test_id: String,
    pub test_name: String,
    pub patient_id: String,
    pub test_date: DateTime<Utc>,
    pub recording_file: String,
}

/// `test_name, count` pair for the `/dtw/diag` endpoint.
#[derive(Debug)]
pub struct TestNameCount {
    pub test_name: String,
    pub count: i64,
}

/// Every distinct `test_name` that has at least one stored result, A-Z.
pub async fn distinct_test_names(pool: &SqlitePool) -> DbResultT<Vec<String>> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT DISTINCT test_name FROM test_results ORDER BY test_name")
            .fetch_all(pool)
            .await?;
    Ok(rows.into_iter().map(|(name,)| name).collect())
}

/// Summary rows for one test name, newest session first.
pub async fn sessions_for_test(pool: &SqlitePool, test_name: &str) -> DbResultT<Vec<SessionSummary>> {
    let rows: Vec<SessionSummaryRow> = sqlx::query_as(
        r#"
        SELECT
            test_id AS session_id,
            patient_id,
            test_name,
            test_date,
            model,
            frame_count,
            similarity_overall,
            distance_pos
        FROM test_results
        WHERE test_name = ?
        ORDER BY test_date DESC
        "#,
    )
    .bind(test_name)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(SessionSummaryRow::into_summary).collect())
}

/// Finds the `(test_name, test_id)` pair for a session id, regardless of
/// which `test_name` route it's being looked up under.
pub async fn lookup_session(pool: &SqlitePool, session_id: &str) -> DbResultT<Option<LookupRow>> {
    let row: Option<LookupRow> = sqlx::query_as(
        "SELECT test_id, test_name, patient_id, test_date, recording_file FROM test_results WHERE test_id = ?",
    )
    .bind(session_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// The full result for one `(test_name, session_id)` pair, series included.
pub async fn full_result(
    pool: &SqlitePool,
    test_name: &str,
    session_id: &str,
) -> DbResultT<Option<TestResult>> {
    let row: Option<TestResultRow> =
        sqlx::query_as("SELECT * FROM test_results WHERE test_name = ? AND test_id = ?")
            .bind(test_name)
            .bind(session_id)
            .fetch_optional(pool)
            .await?;

    row.map(TestResultRow::into_test_result).transpose()
}

/// One recording row for the `/videos/{patient_id}/{test}` listing.
#[derive(Debug, FromRow)]
pub struct RecordingRow {
    pub test_id: String,
    pub recording_file: String,
    pub test_date: DateTime<Utc>,
}

/// Recordings for one `(patient_id, test_name)` pair, newest first.
pub async fn recordings_for_patient_test(
    pool: &SqlitePool,
    patient_id: &str,
    test_name: &str,
) -> DbResultT<Vec<RecordingRow>> {
    let rows: Vec<RecordingRow> = sqlx::query_as(
        "SELECT test_id, recording_file, test_date FROM test_results
         WHERE patient_id = ? AND test_name = ? ORDER BY test_date DESC",
    )
    .bind(patient_id)
    .bind(test_name)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Per-test-name row counts for the `/dtw/diag` endpoint.
pub async fn diag_counts(pool: &SqlitePool) -> DbResultT<Vec<TestNameCount>> {
    let rows: Vec<(String, i64)> =
        sqlx::query_as("SELECT test_name, COUNT(*) FROM test_results GROUP BY test_name ORDER BY test_name")
            .fetch_all(pool)
            .await?;
    Ok(rows
        .into_iter()
        .map(|(test_name, count)| TestNameCount { test_name, count })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::connect;
    use crate::store::insert_test_result;
    use motion_models::test_result::ChannelResult;

    async fn test_pool() -> (tempfile::TempDir, SqlitePool) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}/motion.db", dir.path().display());
        let pool = connect(&url).await.unwrap();
        (dir, pool)
    }

    fn sample(test_id: &str, test_name: &str) -> TestResult {
        let channel = ChannelResult {
            distance: 1.0,
            similarity: 0.5,
            r: 1.0,
            l: 1.0,
            local_costs: vec![0.0],
            aligned_ref_by_live: vec![0],
        };
        TestResult {
            test_id: test_id.to_string(),
            patient_id: "p1".to_string(),
            test_name: test_name.to_string(),
            model: "hands".to_string(),
            test_date: Utc::now(),
            fps: 30.0,
            recording_file: format!("{test_id}.mp4"),
            frame_count: 10,
            similarity_overall: 0.6,
            avg_step_pos: 0.1,
            position: channel.clone(),
            amplitude: channel.clone(),
            speed: channel,
        }
    }

    #[tokio::test]
    async fn distinct_names_and_sessions_reflect_inserted_rows() {
        let (_dir, pool) = test_pool().await;
        insert_test_result(&pool, &sample("s1", "finger_tapping")).await.unwrap();
        insert_test_result(&pool, &sample("s2", "finger_tapping")).await.unwrap();
        insert_test_result(&pool, &sample("s3", "hand_open_close")).await.unwrap();

        let names = distinct_test_names(&pool).await.unwrap();
        assert_eq!(names, vec!["finger_tapping".to_string(), "hand_open_close".to_string()]);

        let sessions = sessions_for_test(&pool, "finger_tapping").await.unwrap();
        assert_eq!(sessions.len(), 2);
    }

    #[tokio::test]
    async fn recordings_for_patient_test_filters_by_both_keys() {
        let (_dir, pool) = test_pool().await;
        insert_test_result(&pool, &sample("s1", "finger_tapping")).await.unwrap();
        insert_test_result(&pool, &sample("s2", "hand_open_close")).await.unwrap();

        let rows = recordings_for_patient_test(&pool, "p1", "finger_tapping").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].recording_file, "s1.mp4");

        let none = recordings_for_patient_test(&pool, "someone-else", "finger_tapping").await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn full_result_round_trips_series_fields() {
        let (_dir, pool) = test_pool().await;
        let original = sample("s1", "finger_tapping");
        insert_test_result(&pool, &original).await.unwrap();

        let fetched = full_result(&pool, "finger_tapping", "s1").await.unwrap().unwrap();
        assert_eq!(fetched.position.aligned_ref_by_live, vec![0]);
        assert_eq!(fetched.similarity_overall, 0.6);
    }

    #[tokio::test]
    async fn full_result_is_none_for_mismatched_test_name() {
        let (_dir, pool) = test_pool().await;
        insert_test_result(&pool, &sample("s1", "finger_tapping")).await.unwrap();
        let fetched = full_result(&pool, "hand_open_close", "s1").await.unwrap();
        assert!(fetched.is_none());
    }

    #[tokio::test]
    async fn diag_counts_group_by_test_name() {
        let (_dir, pool) = test_pool().await;
        insert_test_result(&pool, &sample("s1", "finger_tapping")).await.unwrap();
        insert_test_result(&pool, &sample("s2", "finger_tapping")).await.unwrap();

        let counts = diag_counts(&pool).await.unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[0].test_name, "finger_tapping");
        assert_eq!(counts[0].count, 2);
    }
}
