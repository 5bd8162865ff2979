//! API configuration, per §6.2.

use std::time::Duration;

use motion_dtw::Band;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// SQLite connection URL (`DB_URL`).
    pub db_url: String,
    /// Recording output directory (`RECORDINGS_DIR`).
    pub recordings_dir: String,
    /// Template root directory (`TEMPLATES_DIR`).
    pub templates_dir: String,
    /// Server host (`HOST`).
    pub host: String,
    /// Server port (`PORT`).
    pub port: u16,
    /// CORS origins (`CORS_ORIGINS`).
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second (`RATE_LIMIT_RPS`).
    pub rate_limit_rps: u32,
    /// Rate limit burst (`RATE_LIMIT_BURST`).
    pub rate_limit_burst: u32,
    /// Request timeout.
    pub request_timeout: Duration,
    /// Max request body size.
    pub max_body_size: usize,
    /// Environment (development/production).
    pub environment: String,
    /// Global default Sakoe-Chiba band (`DTW_SAKOE_RADIUS`), overridable
    /// per-session via `init`'s `sakoeRadius` field.
    pub default_band: Band,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            db_url: "sqlite://motion.db".to_string(),
            recordings_dir: "./recordings".to_string(),
            templates_dir: "./templates".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            rate_limit_burst: 20,
            request_timeout: Duration::from_secs(30),
            max_body_size: 10 * 1024 * 1024, // 10MB
            environment: "development".to_string(),
            default_band: Band::Auto,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            db_url: std::env::var("DB_URL").unwrap_or_else(|_| "sqlite://motion.db".to_string()),
            recordings_dir: std::env::var("RECORDINGS_DIR").unwrap_or_else(|_| "./recordings".to_string()),
            templates_dir: std::env::var("TEMPLATES_DIR").unwrap_or_else(|_| "./templates".to_string()),
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8080),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|_| vec!["*".to_string()]),
            rate_limit_rps: std::env::var("RATE_LIMIT_RPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            rate_limit_burst: std::env::var("RATE_LIMIT_BURST")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(20),
            request_timeout: Duration::from_secs(
                std::env::var("REQUEST_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10 * 1024 * 1024),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            default_band: parse_band(std::env::var("DTW_SAKOE_RADIUS").ok().as_deref()),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}

fn parse_band(raw: Option<&str>) -> Band {
    match raw.map(str::trim) {
        None | Some("") | Some("auto") => Band::Auto,
        Some("none") | Some("unrestricted") => Band::Unrestricted,
        Some(n) => n.parse::<usize>().map(Band::Fixed).unwrap_or(Band::Auto),
    }
}
