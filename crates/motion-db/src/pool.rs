//! SQLite connection pool + migration bootstrap.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

use crate::error::DbResultT;

/// Connects to `db_url` (e.g. `sqlite://motion.db`), creating the file if it
/// doesn't exist, and brings the schema up to date.
pub async fn connect(db_url: &str) -> DbResultT<SqlitePool> {
    let opts = SqliteConnectOptions::from_str(db_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(sqlx::Error::from)?;

    Ok(pool)
}
