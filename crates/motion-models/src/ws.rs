//! Ingest transport message types.
//!
//! `ClientMessage` is what the transport decodes off the wire; `ServerEvent`
//! is what the session state machine emits back. Keeping these as plain
//! serde types (rather than deciding on the wire format inside the
//! transport) lets the state machine in `motion-session` stay a pure
//! function of `(state, ClientMessage) -> (state, Vec<ServerEvent>)`.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A message received from the client over the ingest transport.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Start a session for a given patient/test/model.
    Init {
        #[serde(rename = "patientId")]
        patient_id: String,
        /// Accepts either `testType` or `test_name` from the client.
        #[serde(alias = "testType", alias = "test_name")]
        test_name: String,
        model: String,
        #[serde(default)]
        fps: Option<f64>,
        #[serde(rename = "testId", default)]
        test_id: Option<String>,
        #[serde(rename = "sakoeRadius", default)]
        sakoe_radius: Option<SakoeRadius>,
    },
    /// One captured frame.
    Frame {
        /// `"data:image/jpeg;base64,...."` or a raw base64 payload.
        data: String,
    },
    /// Advisory pause/resume; must not alter scoring.
    Pause { paused: bool },
    /// End the session and trigger finalization.
    End,
}

/// Sakoe-Chiba band radius selection carried in `init`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum SakoeRadius {
    Auto(AutoTag),
    Fixed(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AutoTag {
    Auto,
}

/// A message emitted by the server over the ingest transport.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Lifecycle status update (`initialized`, `paused`, `resumed`).
    Status {
        status: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
        timestamp: DateTime<Utc>,
    },
    /// Per-frame landmark echo, so the client UI can draw the skeleton live.
    Keypoints {
        model: String,
        #[serde(rename = "frameIdx")]
        frame_idx: u64,
        dropped: bool,
    },
    /// Protocol/capture-level error; session state is otherwise unaffected.
    Error {
        #[serde(rename = "where")]
        where_: String,
        message: String,
    },
    /// Scoring failed at finalize; no TestResult row was written.
    DtwError { reason: String, message: String },
    /// Finalization succeeded and a TestResult row was persisted.
    Complete {
        #[serde(rename = "testId")]
        test_id: String,
        #[serde(rename = "similarityOverall")]
        similarity_overall: f64,
    },
}

impl ServerEvent {
    pub fn status(status: impl Into<String>) -> Self {
        ServerEvent::Status {
            status: status.into(),
            detail: None,
            timestamp: Utc::now(),
        }
    }

    pub fn status_with_detail(status: impl Into<String>, detail: impl Into<String>) -> Self {
        ServerEvent::Status {
            status: status.into(),
            detail: Some(detail.into()),
            timestamp: Utc::now(),
        }
    }

    pub fn keypoints(model: impl Into<String>, frame_idx: u64, dropped: bool) -> Self {
        ServerEvent::Keypoints {
            model: model.into(),
            frame_idx,
            dropped,
        }
    }

    pub fn error(where_: impl Into<String>, message: impl Into<String>) -> Self {
        ServerEvent::Error {
            where_: where_.into(),
            message: message.into(),
        }
    }

    pub fn dtw_error(reason: impl Into<String>, message: impl Into<String>) -> Self {
        ServerEvent::DtwError {
            reason: reason.into(),
            message: message.into(),
        }
    }

    pub fn complete(test_id: impl Into<String>, similarity_overall: f64) -> Self {
        ServerEvent::Complete {
            test_id: test_id.into(),
            similarity_overall,
        }
    }
}
