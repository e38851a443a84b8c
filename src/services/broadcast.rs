//! Outbound event gate and fan-out.
//!
//! Every event headed for display clients passes through [`publish_value`],
//! which drops malformed or empty frames before they reach the public
//! stream. The diagnostic stream receives a copy of everything published.

use serde_json::Value;
use tracing::debug;

use crate::{
    dto::{
        event::{EVT_BOARD, EVT_LOBBY, EVT_MATCH_ENDED, GameEvent},
        sse::ServerEvent,
    },
    state::SharedState,
};

/// Event kinds that legitimately carry no player list.
const PLAYERLESS_KINDS: [&str; 3] = [EVT_MATCH_ENDED, EVT_BOARD, EVT_LOBBY];

/// A frame may go out when it names its event kind and, unless the kind
/// is inherently playerless, carries a non-empty player list.
pub fn passes_filter(payload: &Value) -> bool {
    let Some(kind) = payload.get("event").and_then(Value::as_str) else {
        return false;
    };
    if PLAYERLESS_KINDS.contains(&kind) {
        return true;
    }
    payload
        .get("players")
        .and_then(Value::as_array)
        .is_some_and(|players| !players.is_empty())
}

/// Publish a raw JSON payload to display clients, dropping frames that
/// fail the gate.
pub fn publish_value(state: &SharedState, payload: &Value) {
    if !passes_filter(payload) {
        debug!("withheld an event frame without displayable content");
        return;
    }
    let kind = payload
        .get("event")
        .and_then(Value::as_str)
        .map(str::to_string);
    if let Ok(event) = ServerEvent::json(kind, payload) {
        state.public_sse().broadcast(event);
    }
    if let Ok(event) = ServerEvent::json(Some("published".to_string()), payload) {
        state.debug_sse().broadcast(event);
    }
}

/// Publish a processed game event.
pub fn publish_game_event(state: &SharedState, event: &GameEvent) {
    match serde_json::to_value(event) {
        Ok(payload) => publish_value(state, &payload),
        Err(err) => debug!(error = %err, "unserializable game event"),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::passes_filter;

    #[test]
    fn frames_without_event_kind_are_withheld() {
        assert!(!passes_filter(&json!({"players": [{"name": "ann"}]})));
    }

    #[test]
    fn game_frames_need_players() {
        assert!(!passes_filter(&json!({"event": "game-update"})));
        assert!(!passes_filter(&json!({"event": "game-update", "players": []})));
        assert!(passes_filter(
            &json!({"event": "game-update", "players": [{"name": "ann"}]})
        ));
    }

    #[test]
    fn playerless_kinds_pass_unconditionally() {
        assert!(passes_filter(&json!({"event": "match-ended", "players": []})));
        assert!(passes_filter(
            &json!({"event": "board", "data": {"status": "Takeout Started"}})
        ));
        assert!(passes_filter(
            &json!({"event": "lobby", "action": "player-left", "player": "bob"})
        ));
    }
}
