//! Application state.

use std::sync::Arc;

use sqlx::SqlitePool;

use motion_templates::TemplateLibrary;
use motion_worker::WorkerPool;

use crate::config::ApiConfig;

/// Shared application state, handed to every handler and WS connection.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub db: SqlitePool,
    pub templates: Arc<TemplateLibrary>,
    pub worker: Arc<WorkerPool>,
    pub recordings_dir: Arc<str>,
}

impl AppState {
    /// Connect to the database, open the template library, and size the
    /// worker pool from config / the environment.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let db = motion_db::connect(&config.db_url).await?;
        let templates = TemplateLibrary::new(config.templates_dir.clone());
        let worker = WorkerPool::from_env();
        let recordings_dir: Arc<str> = Arc::from(config.recordings_dir.as_str());

        Ok(Self {
            config,
            db,
            templates: Arc::new(templates),
            worker: Arc::new(worker),
            recordings_dir,
        })
    }
}
