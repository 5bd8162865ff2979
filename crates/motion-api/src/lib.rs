//! Axum HTTP/WS API server for the motion assessment backend.
//!
//! This crate provides:
//! - The session ingest WebSocket (C6) and finalize orchestration (C3-C8)
//! - Read projections over finalized sessions (C9)
//! - Ownership-gated recording access (§6.1)
//! - Rate limiting, security headers, and Prometheus metrics

pub mod config;
pub mod error;
pub mod finalize;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod ws;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
