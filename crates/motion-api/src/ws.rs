//! Ingest Transport (C6): decodes the wire protocol, drives the session
//! reducer, and turns an accepted `end` into a finalize run.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, info, warn};

use motion_features::NullLandmarkSource;
use motion_models::{ClientMessage, ServerEvent};
use motion_session::{Session, SessionInput};

use crate::finalize::{run_finalize, FinalizeError};
use crate::metrics;
use crate::state::AppState;

static ACTIVE_SESSIONS: AtomicI64 = AtomicI64::new(0);

const WS_SEND_BUFFER_SIZE: usize = 32;
const WS_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const WS_CLIENT_TIMEOUT: Duration = Duration::from_secs(60);

/// Pose sessions always request the 2-D (66-dim) feature width; the 3-D
/// variant has no wire affordance to opt into yet.
const USE_Z: bool = false;

/// Send a `ServerEvent` with backpressure handling; `false` means the
/// client is gone and the connection should be torn down.
async fn send_event(tx: &mpsc::Sender<Message>, event: &ServerEvent) -> bool {
    let json = match serde_json::to_string(event) {
        Ok(j) => j,
        Err(_) => return false,
    };
    match tx.try_send(Message::Text(json.clone())) {
        Ok(_) => true,
        Err(mpsc::error::TrySendError::Full(_)) => {
            debug!("ws send buffer full, applying backpressure");
            tx.send(Message::Text(json)).await.is_ok()
        }
        Err(mpsc::error::TrySendError::Closed(_)) => false,
    }
}

pub async fn ws_session(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let count = ACTIVE_SESSIONS.fetch_add(1, Ordering::SeqCst) + 1;
    metrics::set_active_sessions(count);
    metrics::record_ws_connection("session");

    ws.on_upgrade(|socket| async move {
        handle_session_socket(socket, state).await;
        let count = ACTIVE_SESSIONS.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::set_active_sessions(count);
    })
}

async fn handle_session_socket(socket: WebSocket, state: AppState) {
    let (ws_sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<Message>(WS_SEND_BUFFER_SIZE);

    let send_task = tokio::spawn(async move {
        let mut ws_sender = ws_sender;
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut session = Session::new();
    let mut heartbeat = interval(WS_HEARTBEAT_INTERVAL);
    let mut last_activity = std::time::Instant::now();

    'outer: loop {
        tokio::select! {
            msg = tokio::time::timeout(WS_CLIENT_TIMEOUT, receiver.next()) => {
                let msg = match msg {
                    Ok(Some(Ok(m))) => m,
                    Ok(Some(Err(e))) => {
                        warn!("ws receive error: {}", e);
                        break 'outer;
                    }
                    Ok(None) | Err(_) => {
                        info!("ws connection closed or idle timeout");
                        break 'outer;
                    }
                };

                match msg {
                    Message::Text(text) => {
                        last_activity = std::time::Instant::now();
                        metrics::record_ws_message_received("session");
                        if !handle_text(&text, &mut session, &state, &tx).await {
                            break 'outer;
                        }
                        if session.state().is_terminal() {
                            break 'outer;
                        }
                    }
                    Message::Pong(_) => {
                        last_activity = std::time::Instant::now();
                    }
                    Message::Close(_) => {
                        info!("client closed connection");
                        break 'outer;
                    }
                    _ => {}
                }
            }
            _ = heartbeat.tick() => {
                if last_activity.elapsed() > WS_HEARTBEAT_INTERVAL / 2
                    && tx.send(Message::Ping(vec![])).await.is_err()
                {
                    warn!("heartbeat failed, client disconnected");
                    break 'outer;
                }
            }
        }
    }

    drop(tx);
    let _ = send_task.await;
}

/// Decode one inbound text frame, drive the reducer, and send every
/// resulting event (plus the finalize outcome, if any). Returns `false` if
/// the send side has gone away and the connection should close.
async fn handle_text(text: &str, session: &mut Session, state: &AppState, tx: &mpsc::Sender<Message>) -> bool {
    let client_msg: ClientMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            return send_event(tx, &ServerEvent::error("protocol", format!("invalid message: {e}"))).await;
        }
    };

    let input = match client_msg {
        ClientMessage::Init {
            patient_id,
            test_name,
            model,
            fps,
            test_id,
            sakoe_radius,
        } => SessionInput::Init {
            patient_id,
            test_name,
            model,
            fps,
            test_id,
            sakoe_radius,
        },
        ClientMessage::Frame { data } => SessionInput::Frame(decode_frame(&data)),
        ClientMessage::Pause { paused } => SessionInput::Pause { paused },
        ClientMessage::End => SessionInput::End,
    };

    // The extractor itself is pure per-frame arithmetic (see
    // motion_features::extract); the only real CPU sink in this pipeline is
    // DTW at finalize, which already runs on the worker pool in
    // finalize::run_finalize. A pluggable LandmarkSource that does real
    // model inference would need its own offload here, but NullLandmarkSource
    // is the production wiring per SPEC_FULL §4.2a.
    let output = session.apply(input, &state.templates, &NullLandmarkSource, USE_Z);

    for event in &output.events {
        if let ServerEvent::Keypoints { model, dropped, .. } = event {
            if *dropped {
                metrics::record_extractor_drop(model);
            } else {
                metrics::record_frame_ingested(model);
            }
        }
        metrics::record_ws_message_sent("session", event_label(event));
        if !send_event(tx, event).await {
            return false;
        }
    }

    if let Some(req) = output.finalize {
        let event = match run_finalize(state, req).await {
            Ok(result) => ServerEvent::complete(result.test_id, result.similarity_overall),
            Err(FinalizeError::Scoring { reason, message }) => {
                metrics::record_finalize_outcome(false);
                ServerEvent::dtw_error(reason, message)
            }
            Err(FinalizeError::Persistence { where_, message }) => {
                metrics::record_finalize_outcome(false);
                ServerEvent::error(where_, message)
            }
        };
        metrics::record_ws_message_sent("session", event_label(&event));
        return send_event(tx, &event).await;
    }

    true
}

fn event_label(event: &ServerEvent) -> &'static str {
    match event {
        ServerEvent::Status { .. } => "status",
        ServerEvent::Keypoints { .. } => "keypoints",
        ServerEvent::Error { .. } => "error",
        ServerEvent::DtwError { .. } => "dtw_error",
        ServerEvent::Complete { .. } => "complete",
    }
}

/// Decodes a frame payload, stripping an optional `data:image/...;base64,`
/// prefix.
fn decode_frame(data: &str) -> Result<Vec<u8>, String> {
    use base64::Engine;
    let raw = match data.find(";base64,") {
        Some(idx) => &data[idx + ";base64,".len()..],
        None => data,
    };
    base64::engine::general_purpose::STANDARD
        .decode(raw)
        .map_err(|e| format!("invalid base64 frame data: {e}"))
}
