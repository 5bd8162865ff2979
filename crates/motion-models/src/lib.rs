//! Shared data models for the motion assessment backend.
//!
//! This crate provides serde-serializable types for:
//! - the ingest transport protocol (`ws.rs`: `ClientMessage` / `ServerEvent`)
//! - the landmark family a session/template is keyed by (`model.rs`)
//! - canonical test-name normalization (`canonical.rs`)
//! - the persisted TestResult row and read-side projections (`test_result.rs`)

pub mod canonical;
pub mod model;
pub mod test_result;
pub mod ws;

pub use canonical::{is_canonical, normalize_test_name, CANONICAL_TEST_NAMES};
pub use model::{TestModel, UnsupportedModel};
pub use test_result::{ChannelResult, SessionSummary, TestResult};
pub use ws::{AutoTag, ClientMessage, SakoeRadius, ServerEvent};
