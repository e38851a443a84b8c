//! Command envelope exchanged with display clients over the WebSocket.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Command sent by a display client.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CommandEnvelope {
    /// Action name, e.g. `undo_throw` or `calibrate_board`.
    pub action: String,
    /// Action-specific parameters.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub params: Value,
    /// Correlation id; when present a `command_response` is sent back.
    pub callback_id: Option<String>,
}

/// Correlated reply to a [`CommandEnvelope`].
#[derive(Debug, Serialize, ToSchema)]
pub struct CommandResponse {
    /// Always `command_response`.
    pub event: &'static str,
    /// Correlation id echoed from the command.
    pub callback_id: String,
    /// Command result, or `{"error": ...}` when the command failed.
    #[schema(value_type = Object)]
    pub data: Value,
}

impl CommandResponse {
    /// Build a reply for the given correlation id.
    pub fn new(callback_id: String, data: Value) -> Self {
        Self {
            event: "command_response",
            callback_id,
            data,
        }
    }
}
