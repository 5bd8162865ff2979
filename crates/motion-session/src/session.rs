//! Session State Machine (C5): per-connection lifecycle, §4.5. A pure
//! reducer around which the transport and worker-pool offload are thin
//! shells, per §9's design note.

use std::sync::Arc;

use ndarray::Array2;
use uuid::Uuid;

use motion_features::{extract, LandmarkSource};
use motion_models::{normalize_test_name, SakoeRadius, ServerEvent, TestModel};
use motion_templates::TemplateLibrary;

use crate::logger::SessionLogger;
use crate::state::SessionState;

/// What the reducer accepts, one variant per wire message in §4.6. `Frame`
/// carries the *already base64-decoded* bytes (or the decode failure
/// reason) — base64 handling is the ingest transport's (C6) job, not the
/// state machine's.
#[derive(Debug, Clone)]
pub enum SessionInput {
    Init {
        patient_id: String,
        test_name: String,
        model: String,
        fps: Option<f64>,
        test_id: Option<String>,
        sakoe_radius: Option<SakoeRadius>,
    },
    Frame(Result<Vec<u8>, String>),
    Pause { paused: bool },
    End,
}

/// Everything finalization (§4.8, spanning C3-C8) needs, handed off by
/// value once `end` is accepted. The session's buffers are drained into
/// this, not cloned.
#[derive(Debug)]
pub struct FinalizeRequest {
    pub test_id: String,
    pub patient_id: String,
    pub test_name: String,
    pub model: TestModel,
    pub fps_hint: Option<f64>,
    pub sakoe_radius: Option<SakoeRadius>,
    pub template: Arc<Array2<f32>>,
    pub frame_buffer: Vec<Vec<u8>>,
    pub feature_buffer: Vec<Vec<f32>>,
}

/// The reducer's output: zero or more outbound events, plus a finalize
/// request when `end` has just been accepted.
#[derive(Debug, Default)]
pub struct ReducerOutput {
    pub events: Vec<ServerEvent>,
    pub finalize: Option<FinalizeRequest>,
}

impl ReducerOutput {
    fn single(event: ServerEvent) -> Self {
        Self {
            events: vec![event],
            finalize: None,
        }
    }
}

/// Per-connection session state: lifecycle, buffers, and counters from §3.
#[derive(Debug)]
pub struct Session {
    state: SessionState,
    patient_id: Option<String>,
    test_name: Option<String>,
    model: Option<TestModel>,
    test_id: Option<String>,
    fps_hint: Option<f64>,
    sakoe_radius: Option<SakoeRadius>,
    template: Option<Arc<Array2<f32>>>,
    frame_buffer: Vec<Vec<u8>>,
    feature_buffer: Vec<Vec<f32>>,
    frames_seen: u64,
    features_built: u64,
    feature_drops: u64,
    logger: Option<SessionLogger>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::InitPending,
            patient_id: None,
            test_name: None,
            model: None,
            test_id: None,
            fps_hint: None,
            sakoe_radius: None,
            template: None,
            frame_buffer: Vec::new(),
            feature_buffer: Vec::new(),
            frames_seen: 0,
            features_built: 0,
            feature_drops: 0,
            logger: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    pub fn features_built(&self) -> u64 {
        self.features_built
    }

    pub fn feature_drops(&self) -> u64 {
        self.feature_drops
    }

    pub fn test_id(&self) -> Option<&str> {
        self.test_id.as_deref()
    }

    /// Apply one inbound message, mutating state and returning outbound
    /// events (and, on a successful `end`, a finalize request). `use_z`
    /// selects the 3-D pose feature width; `templates`/`detector` are the
    /// C1/extractor-boundary collaborators this reducer is driven by.
    pub fn apply(
        &mut self,
        input: SessionInput,
        templates: &TemplateLibrary,
        detector: &dyn LandmarkSource,
        use_z: bool,
    ) -> ReducerOutput {
        match input {
            SessionInput::Init {
                patient_id,
                test_name,
                model,
                fps,
                test_id,
                sakoe_radius,
            } => self.apply_init(patient_id, test_name, model, fps, test_id, sakoe_radius, templates),
            SessionInput::Frame(decoded) => self.apply_frame(decoded, detector, use_z),
            SessionInput::Pause { paused } => self.apply_pause(paused),
            SessionInput::End => self.apply_end(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_init(
        &mut self,
        patient_id: String,
        test_name: String,
        model: String,
        fps: Option<f64>,
        test_id: Option<String>,
        sakoe_radius: Option<SakoeRadius>,
        templates: &TemplateLibrary,
    ) -> ReducerOutput {
        if self.state != SessionState::InitPending {
            return ReducerOutput::single(ServerEvent::error("init", "Already initialized"));
        }

        let parsed_model = match model.parse::<TestModel>() {
            Ok(m) => m,
            Err(e) => {
                self.state = SessionState::Errored;
                return ReducerOutput::single(ServerEvent::error("init", e.to_string()));
            }
        };

        let canonical = normalize_test_name(&test_name);

        let template = match templates.load(&canonical, parsed_model) {
            Ok(t) => t,
            Err(e) => {
                self.state = SessionState::Errored;
                return ReducerOutput::single(ServerEvent::error("init", e.to_string()));
            }
        };

        let test_id = test_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let logger = SessionLogger::new(&test_id, &canonical);
        logger.log_start("session initialized");

        self.patient_id = Some(patient_id);
        self.test_name = Some(canonical);
        self.model = Some(parsed_model);
        self.test_id = Some(test_id);
        self.fps_hint = fps.filter(|f| *f > 0.0);
        self.sakoe_radius = sakoe_radius;
        self.template = Some(template);
        self.logger = Some(logger);
        self.state = SessionState::Running;

        ReducerOutput::single(ServerEvent::status("initialized"))
    }

    fn apply_frame(
        &mut self,
        decoded: Result<Vec<u8>, String>,
        detector: &dyn LandmarkSource,
        use_z: bool,
    ) -> ReducerOutput {
        if !self.state.is_capturing() {
            return ReducerOutput::single(ServerEvent::error("frame", "Not initialized"));
        }

        self.frames_seen += 1;
        let frame_idx = self.frames_seen - 1;
        let model = self.model.expect("capturing implies init succeeded");

        let bytes = match decoded {
            Ok(bytes) => bytes,
            Err(reason) => {
                self.feature_drops += 1;
                return ReducerOutput::single(ServerEvent::error("frame", reason));
            }
        };
        self.frame_buffer.push(bytes.clone());

        let landmarks = detector.detect(&bytes);
        match extract(model, &landmarks, use_z) {
            Ok(features) => {
                self.feature_buffer.push(features);
                self.features_built += 1;
                ReducerOutput::single(ServerEvent::keypoints(model.as_str(), frame_idx, false))
            }
            Err(_drop) => {
                self.feature_drops += 1;
                ReducerOutput::single(ServerEvent::keypoints(model.as_str(), frame_idx, true))
            }
        }
    }

    fn apply_pause(&mut self, paused: bool) -> ReducerOutput {
        if !self.state.is_capturing() {
            return ReducerOutput::single(ServerEvent::error("pause", "Not initialized"));
        }
        self.state = if paused {
            SessionState::Paused
        } else {
            SessionState::Running
        };
        ReducerOutput::single(ServerEvent::status(if paused { "paused" } else { "resumed" }))
    }

    fn apply_end(&mut self) -> ReducerOutput {
        if !self.state.is_capturing() {
            return ReducerOutput::single(ServerEvent::error("end", "Not initialized"));
        }

        if self.features_built == 0 {
            return ReducerOutput::single(ServerEvent::dtw_error(
                "NoFeatures",
                "session ended with zero extracted features",
            ));
        }

        self.state = SessionState::Ended;
        if let Some(logger) = &self.logger {
            logger.log_completion("end accepted, finalize pending");
        }

        let finalize = FinalizeRequest {
            test_id: self.test_id.clone().expect("running implies test_id set"),
            patient_id: self.patient_id.clone().expect("running implies patient_id set"),
            test_name: self.test_name.clone().expect("running implies test_name set"),
            model: self.model.expect("running implies model set"),
            fps_hint: self.fps_hint,
            sakoe_radius: self.sakoe_radius,
            template: self.template.clone().expect("running implies template set"),
            frame_buffer: std::mem::take(&mut self.frame_buffer),
            feature_buffer: std::mem::take(&mut self.feature_buffer),
        };

        ReducerOutput {
            events: Vec::new(),
            finalize: Some(finalize),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use motion_features::landmarks::{FrameLandmarks, HandLandmarks, Point3};
    use motion_features::NullLandmarkSource;
    use motion_models::ServerEvent;
    use tempfile::tempdir;

    struct OneHandSource;

    impl LandmarkSource for OneHandSource {
        fn detect(&self, _image: &[u8]) -> FrameLandmarks {
            let points = (0..21)
                .map(|i| Point3::new(i as f32, (i * 2) as f32, 0.0))
                .collect();
            FrameLandmarks {
                hands: vec![HandLandmarks {
                    points,
                    handedness: Some("Right".into()),
                }],
                pose: None,
            }
        }
    }

    fn write_template(root: &std::path::Path, test_name: &str, model: TestModel) {
        use ndarray::Array2;
        use ndarray_npy::NpzWriter;
        use std::fs::File;

        let dir = root.join(test_name);
        std::fs::create_dir_all(&dir).unwrap();
        let file = File::create(dir.join(format!("{}.npz", model.as_str()))).unwrap();
        let mut npz = NpzWriter::new(file);
        let x: Array2<f32> = Array2::zeros((10, model.expected_dim()));
        npz.add_array("X", &x).unwrap();
        npz.finish().unwrap();
    }

    fn init_input(test_name: &str, model: &str) -> SessionInput {
        SessionInput::Init {
            patient_id: "patient-1".into(),
            test_name: test_name.into(),
            model: model.into(),
            fps: Some(30.0),
            test_id: Some("test-1".into()),
            sakoe_radius: None,
        }
    }

    #[test]
    fn init_success_transitions_to_running() {
        let dir = tempdir().unwrap();
        write_template(dir.path(), "stand-and-sit", TestModel::Hands);
        let templates = TemplateLibrary::new(dir.path());
        let mut session = Session::new();

        let out = session.apply(init_input("stand-and-sit", "hands"), &templates, &NullLandmarkSource, false);

        assert_eq!(session.state(), SessionState::Running);
        assert!(matches!(out.events[0], ServerEvent::Status { .. }));
    }

    #[test]
    fn init_with_unsupported_model_errors_out() {
        let dir = tempdir().unwrap();
        let templates = TemplateLibrary::new(dir.path());
        let mut session = Session::new();

        let out = session.apply(init_input("stand-and-sit", "face"), &templates, &NullLandmarkSource, false);

        assert_eq!(session.state(), SessionState::Errored);
        assert!(matches!(out.events[0], ServerEvent::Error { .. }));
    }

    #[test]
    fn init_with_missing_template_errors_out() {
        let dir = tempdir().unwrap();
        let templates = TemplateLibrary::new(dir.path());
        let mut session = Session::new();

        let out = session.apply(init_input("stand-and-sit", "hands"), &templates, &NullLandmarkSource, false);

        assert_eq!(session.state(), SessionState::Errored);
        assert!(matches!(out.events[0], ServerEvent::Error { .. }));
    }

    #[test]
    fn frame_before_init_is_a_protocol_error() {
        let mut session = Session::new();
        let dir = tempdir().unwrap();
        let templates = TemplateLibrary::new(dir.path());

        let out = session.apply(SessionInput::Frame(Ok(vec![1, 2, 3])), &templates, &NullLandmarkSource, false);

        assert_eq!(session.frames_seen(), 0);
        match &out.events[0] {
            ServerEvent::Error { where_, message } => {
                assert_eq!(where_, "frame");
                assert_eq!(message, "Not initialized");
            }
            other => panic!("expected error event, got {other:?}"),
        }
    }

    #[test]
    fn frame_with_detected_hand_builds_a_feature() {
        let dir = tempdir().unwrap();
        write_template(dir.path(), "stand-and-sit", TestModel::Hands);
        let templates = TemplateLibrary::new(dir.path());
        let mut session = Session::new();
        session.apply(init_input("stand-and-sit", "hands"), &templates, &NullLandmarkSource, false);

        let out = session.apply(SessionInput::Frame(Ok(vec![0xFF])), &templates, &OneHandSource, false);

        assert_eq!(session.features_built(), 1);
        assert_eq!(session.feature_drops(), 0);
        assert!(matches!(out.events[0], ServerEvent::Keypoints { dropped: false, .. }));
    }

    #[test]
    fn frame_with_no_detection_is_silently_dropped() {
        let dir = tempdir().unwrap();
        write_template(dir.path(), "stand-and-sit", TestModel::Hands);
        let templates = TemplateLibrary::new(dir.path());
        let mut session = Session::new();
        session.apply(init_input("stand-and-sit", "hands"), &templates, &NullLandmarkSource, false);

        let out = session.apply(SessionInput::Frame(Ok(vec![0xFF])), &templates, &NullLandmarkSource, false);

        assert_eq!(session.features_built(), 0);
        assert_eq!(session.feature_drops(), 1);
        assert!(matches!(out.events[0], ServerEvent::Keypoints { dropped: true, .. }));
    }

    #[test]
    fn pause_and_resume_toggle_state() {
        let dir = tempdir().unwrap();
        write_template(dir.path(), "stand-and-sit", TestModel::Hands);
        let templates = TemplateLibrary::new(dir.path());
        let mut session = Session::new();
        session.apply(init_input("stand-and-sit", "hands"), &templates, &NullLandmarkSource, false);

        session.apply(SessionInput::Pause { paused: true }, &templates, &NullLandmarkSource, false);
        assert_eq!(session.state(), SessionState::Paused);

        session.apply(SessionInput::Pause { paused: false }, &templates, &NullLandmarkSource, false);
        assert_eq!(session.state(), SessionState::Running);
    }

    #[test]
    fn end_with_zero_features_reports_no_features_and_stays_running() {
        let dir = tempdir().unwrap();
        write_template(dir.path(), "stand-and-sit", TestModel::Hands);
        let templates = TemplateLibrary::new(dir.path());
        let mut session = Session::new();
        session.apply(init_input("stand-and-sit", "hands"), &templates, &NullLandmarkSource, false);

        let out = session.apply(SessionInput::End, &templates, &NullLandmarkSource, false);

        assert_eq!(session.state(), SessionState::Running);
        assert!(out.finalize.is_none());
        assert!(matches!(out.events[0], ServerEvent::DtwError { .. }));
    }

    #[test]
    fn end_with_features_transitions_to_ended_and_drains_buffers() {
        let dir = tempdir().unwrap();
        write_template(dir.path(), "stand-and-sit", TestModel::Hands);
        let templates = TemplateLibrary::new(dir.path());
        let mut session = Session::new();
        session.apply(init_input("stand-and-sit", "hands"), &templates, &NullLandmarkSource, false);
        session.apply(SessionInput::Frame(Ok(vec![0xFF])), &templates, &OneHandSource, false);

        let out = session.apply(SessionInput::End, &templates, &NullLandmarkSource, false);

        assert_eq!(session.state(), SessionState::Ended);
        let finalize = out.finalize.expect("expected a finalize request");
        assert_eq!(finalize.feature_buffer.len(), 1);
        assert_eq!(finalize.frame_buffer.len(), 1);
    }
}
