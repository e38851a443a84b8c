//! Control WebSocket handling.
//!
//! Frontends drive the board and the running match over a WebSocket of
//! JSON command envelopes. Each command is dispatched to the matching
//! REST operation; a response is sent only when the client asked for one
//! by attaching a callback id.

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    dto::command::{CommandEnvelope, CommandResponse},
    error::ServiceError,
    state::SharedState,
    upstream::{api, board},
};

/// Handle the full lifecycle of one control WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps responses flowing even while we await
    // inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    info!("control client connected");

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => {
                let envelope: CommandEnvelope = match serde_json::from_str(&text) {
                    Ok(envelope) => envelope,
                    Err(err) => {
                        warn!(error = %err, "unparsable command frame");
                        continue;
                    }
                };
                let callback_id = envelope.callback_id.clone();
                let data = match dispatch(&state, &envelope.action, envelope.params).await {
                    Ok(data) => data,
                    Err(err) => {
                        warn!(action = %envelope.action, error = %err, "command failed");
                        json!({"error": err.to_string()})
                    }
                };
                if let Some(callback_id) = callback_id {
                    let response = CommandResponse::new(callback_id, data);
                    match serde_json::to_string(&response) {
                        Ok(payload) => {
                            if outbound_tx.send(Message::Text(payload.into())).is_err() {
                                break;
                            }
                        }
                        Err(err) => warn!(error = %err, "unserializable command response"),
                    }
                }
            }
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) | Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(error = %err, "websocket error");
                break;
            }
        }
    }

    info!("control client disconnected");
    finalize(writer_task, outbound_tx).await;
}

/// Execute one command against the board controller or the scoring
/// service.
async fn dispatch(
    state: &SharedState,
    action: &str,
    params: Value,
) -> Result<Value, ServiceError> {
    debug!(%action, "dispatching command");
    match action {
        "start_board" => board::start(state).await,
        "stop_board" => board::stop(state).await,
        "reset_board" => board::reset(state).await,
        "restart_board" => board::restart(state).await,
        "calibrate_board" => {
            let cam_id = params.get("camId").and_then(Value::as_i64);
            let distortion = params
                .get("distortion")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            board::calibrate(state, cam_id, distortion).await
        }
        "get_config" => board::config(state).await,
        "patch_config" => board::patch_config(state, &params).await,
        "get_stats" => board::stats(state).await,
        "get_cams_state" => board::cams_state(state).await,
        "get_cams_stats" => board::cams_stats(state).await,
        "get_board_address" => {
            let address = state
                .board_address()
                .await
                .unwrap_or_else(|| "N/A".into());
            Ok(json!({"board_manager_address": address}))
        }
        "undo_throw" => api::undo_throw(state, &active_match_id(state).await?).await,
        "next_player" => api::next_player(state, &active_match_id(state).await?).await,
        "next_game" => api::next_game(state, &active_match_id(state).await?).await,
        "start_match" => {
            let lobby_id = params
                .get("lobbyId")
                .and_then(Value::as_str)
                .ok_or_else(|| ServiceError::InvalidInput("lobbyId is required".into()))?;
            api::start_lobby_match(state, lobby_id).await
        }
        "correct_throw" => {
            let indices: Vec<i64> = params
                .get("throw_indices")
                .and_then(Value::as_array)
                .map(|values| values.iter().filter_map(Value::as_i64).collect())
                .unwrap_or_default();
            let score = params
                .get("score")
                .and_then(Value::as_i64)
                .ok_or_else(|| ServiceError::InvalidInput("score is required".into()))?;
            if indices.is_empty() {
                return Err(ServiceError::InvalidInput(
                    "throw_indices is required".into(),
                ));
            }
            api::correct_throws(state, &active_match_id(state).await?, &indices, score).await
        }
        other => Err(ServiceError::InvalidInput(format!(
            "unknown action `{other}`"
        ))),
    }
}

/// Identifier of the match being followed; lobby sessions do not count.
async fn active_match_id(state: &SharedState) -> Result<String, ServiceError> {
    let engine = state.engine().lock().await;
    match engine.active_match_id() {
        Some(id) if !id.starts_with("lobby:") => Ok(id.to_string()),
        _ => Err(ServiceError::InvalidState("no match is running".into())),
    }
}

/// Ensure the writer task winds down before we return from the socket
/// handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
