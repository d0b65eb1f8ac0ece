//! Realtime stream handler - websocket protocol and per-connection loop
//!
//! One loop per accepted connection, bound to one session. Messages are
//! handled strictly in arrival order; the next inbound message is not read
//! until the previous one's session update and emissions have completed, so
//! the confidence window always sees frames in stream order.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::detector::run_detect;
use crate::models::{Alert, DetectionResult, SessionSummary};
use crate::registry::SharedSession;
use crate::{AppError, AppState};

/// Client -> server stream messages
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// One base64-encoded video frame
    Frame { data: String },
    /// Accepted but not processed (lip-sync analysis is out of scope)
    Audio,
    /// Ends the receive loop normally
    EndSession,
    #[serde(other)]
    Unknown,
}

/// Server -> client stream messages
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    DetectionResult {
        result: DetectionResult,
        session_summary: SessionSummary,
    },
    Alert {
        alert: Alert,
    },
}

pub async fn ws_detect(
    ws: WebSocketUpgrade,
    Path(session_id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| stream_session(socket, session_id, state))
}

async fn stream_session(mut socket: WebSocket, session_id: String, state: AppState) {
    // Reusing an id replaces the previous session (last-writer-wins)
    let session = state.registry.create(&session_id);
    tracing::info!("Stream session {} opened", session_id);

    if let Err(err) = receive_loop(&mut socket, &session, &state).await {
        tracing::error!("Stream session {} terminated: {:?}", session_id, err);
    }

    // Terminal either way; the registry entry is retained for later lookup
    session.write().close();
    let _ = socket.close().await;
    tracing::info!("Stream session {} closed", session_id);
}

/// Sequential receive loop for one connection.
///
/// Undecodable frames are dropped without a reply and the loop continues;
/// any other failure is fatal for this session only.
async fn receive_loop(
    socket: &mut WebSocket,
    session: &SharedSession,
    state: &AppState,
) -> Result<(), AppError> {
    while let Some(msg) = socket.recv().await {
        let msg = msg.map_err(|e| AppError::ConnectionFailure(e.to_string()))?;

        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => return Ok(()),
            _ => continue,
        };

        let client_msg: ClientMessage = serde_json::from_str(&text)
            .map_err(|e| AppError::ConnectionFailure(format!("malformed message: {}", e)))?;

        match client_msg {
            ClientMessage::Frame { data } => {
                let Some(image) = decode_frame(&data) else {
                    tracing::debug!("Dropping undecodable frame");
                    continue;
                };

                let result =
                    run_detect(state.detector.clone(), image, state.detector_timeout()).await?;

                for outbound in respond_to_frame(session, result) {
                    let payload = serde_json::to_string(&outbound)
                        .map_err(|e| AppError::InternalError(e.to_string()))?;
                    socket
                        .send(Message::Text(payload))
                        .await
                        .map_err(|e| AppError::ConnectionFailure(e.to_string()))?;
                }
            }
            ClientMessage::Audio => {}
            ClientMessage::EndSession => return Ok(()),
            ClientMessage::Unknown => {}
        }
    }

    Ok(())
}

fn decode_frame(data: &str) -> Option<DynamicImage> {
    let bytes = BASE64.decode(data).ok()?;
    image::load_from_memory(&bytes).ok()
}

/// Ingest one accepted result and build the outbound messages for it.
///
/// Emits the detection result with a fresh summary, then - whenever the
/// session holds an alert - the latest alert again. The alert itself latches
/// once, but its notification repeats on every subsequent frame.
fn respond_to_frame(session: &SharedSession, result: DetectionResult) -> Vec<ServerMessage> {
    let mut session = session.write();
    session.add_result(result.clone());

    let mut outbound = vec![ServerMessage::DetectionResult {
        result,
        session_summary: session.summary(),
    }];

    if let Some(alert) = session.latest_alert() {
        outbound.push(ServerMessage::Alert {
            alert: alert.clone(),
        });
    }

    outbound
}
