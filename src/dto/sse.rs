use std::time::SystemTime;

use serde::Serialize;
use utoipa::ToSchema;

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Identifier of the SSE stream (`public` or `debug`).
    pub stream: String,
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the backend is running without a statistics store connection.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    pub degraded: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
/// One raw upstream frame retained in the diagnostic log.
pub struct RawFrame {
    /// Reception timestamp (RFC 3339).
    pub time: String,
    /// Frame text exactly as received.
    pub data: String,
}

impl RawFrame {
    /// Capture a frame with the current timestamp.
    pub fn now(data: impl Into<String>) -> Self {
        Self {
            time: super::format_system_time(SystemTime::now()),
            data: data.into(),
        }
    }
}
