//! Patient/user ownership (§6.1): gates the video/result handlers so a user
//! can only reach recordings for patients they're registered against.

use sqlx::SqlitePool;

use crate::error::DbResultT;

/// True if `patient_id` is registered to `user_id`. Patients with no
/// ownership row are treated as unowned, i.e. access is denied.
pub async fn is_owned_by(pool: &SqlitePool, patient_id: &str, user_id: &str) -> DbResultT<bool> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT user_id FROM patient_ownership WHERE patient_id = ?")
            .bind(patient_id)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(|(owner,)| owner == user_id).unwrap_or(false))
}

/// Registers (or re-registers) a patient to a user.
pub async fn set_owner(pool: &SqlitePool, patient_id: &str, user_id: &str) -> DbResultT<()> {
    sqlx::query(
        "INSERT INTO patient_ownership (patient_id, user_id) VALUES (?, ?)
         ON CONFLICT(patient_id) DO UPDATE SET user_id = excluded.user_id",
    )
    .bind(patient_id)
    .bind(user_id)
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::connect;

    async fn test_pool() -> (tempfile::TempDir, SqlitePool) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}/motion.db", dir.path().display());
        let pool = connect(&url).await.unwrap();
        (dir, pool)
    }

    #[tokio::test]
    async fn unregistered_patient_is_not_owned() {
        let (_dir, pool) = test_pool().await;
        assert!(!is_owned_by(&pool, "patient-1", "user-1").await.unwrap());
    }

    #[tokio::test]
    async fn registered_patient_is_owned_only_by_its_user() {
        let (_dir, pool) = test_pool().await;
        set_owner(&pool, "patient-1", "user-1").await.unwrap();
        assert!(is_owned_by(&pool, "patient-1", "user-1").await.unwrap());
        assert!(!is_owned_by(&pool, "patient-1", "user-2").await.unwrap());
    }

    #[tokio::test]
    async fn re_registering_a_patient_transfers_ownership() {
        let (_dir, pool) = test_pool().await;
        set_owner(&pool, "patient-1", "user-1").await.unwrap();
        set_owner(&pool, "patient-1", "user-2").await.unwrap();
        assert!(!is_owned_by(&pool, "patient-1", "user-1").await.unwrap());
        assert!(is_owned_by(&pool, "patient-1", "user-2").await.unwrap());
    }
}
