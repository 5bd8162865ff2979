//! Structured session logging utilities.
//!
//! Mirrors `motion_worker::logging::JobLogger`'s shape, keyed by
//! `session_id`/`test_name` instead of `job_id`/`operation`.

use tracing::{error, info, warn, Span};

#[derive(Debug, Clone)]
pub struct SessionLogger {
    session_id: String,
    test_name: String,
}

impl SessionLogger {
    pub fn new(session_id: &str, test_name: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            test_name: test_name.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            session_id = %self.session_id,
            test_name = %self.test_name,
            "Session started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            session_id = %self.session_id,
            test_name = %self.test_name,
            "Session progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            session_id = %self.session_id,
            test_name = %self.test_name,
            "Session warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            session_id = %self.session_id,
            test_name = %self.test_name,
            "Session error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            session_id = %self.session_id,
            test_name = %self.test_name,
            "Session completed: {}", message
        );
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "session",
            session_id = %self.session_id,
            test_name = %self.test_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carries_session_id_and_test_name() {
        let logger = SessionLogger::new("sess-1", "stand-and-sit");
        assert_eq!(logger.session_id(), "sess-1");
    }
}
