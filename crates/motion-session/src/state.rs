//! Session lifecycle states, per §4.5.

/// A session's place in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for `init`.
    InitPending,
    /// Capturing; frames append to the buffers and run the extractor.
    Running,
    /// Advisory pause; frames still append and run the extractor.
    Paused,
    /// `end` accepted; the session is done and about to be torn down.
    Ended,
    /// Unrecoverable failure (bad template, unsupported model).
    Errored,
}

impl SessionState {
    pub fn is_capturing(self) -> bool {
        matches!(self, SessionState::Running | SessionState::Paused)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Ended | SessionState::Errored)
    }
}
