use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{
    dto::sse::{Handshake, ServerEvent},
    services::sse_service,
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/api/events",
    responses((status = 200, description = "Scoreboard event stream", content_type = "text/event-stream", body = String))
)]
/// Stream scoreboard events to connected displays.
pub async fn event_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = sse_service::subscribe_public(&state);
    info!("new display SSE connection");
    let initial = handshake_events("public", &state);
    sse_service::to_sse_stream(initial, receiver, "display")
}

#[utoipa::path(
    get,
    path = "/api/debug/raw",
    responses((status = 200, description = "Raw upstream frame stream", content_type = "text/event-stream", body = String))
)]
/// Stream raw upstream frames, replaying the retained log first.
pub async fn raw_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = sse_service::subscribe_debug(&state);
    info!("new diagnostic SSE connection");

    let mut initial = handshake_events("debug", &state);
    for frame in state.raw_frames().await {
        if let Ok(event) = ServerEvent::json(Some("raw".to_string()), &frame) {
            initial.push(event);
        }
    }
    sse_service::to_sse_stream(initial, receiver, "diagnostic")
}

fn handshake_events(stream: &str, state: &SharedState) -> Vec<ServerEvent> {
    let handshake = Handshake {
        stream: stream.to_string(),
        message: format!("subscribed to the {stream} stream"),
        degraded: state.is_degraded(),
    };
    ServerEvent::json(Some("handshake".to_string()), &handshake)
        .into_iter()
        .collect()
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/events", get(event_stream))
        .route("/debug/raw", get(raw_stream))
}
