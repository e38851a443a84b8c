//! Inbound push-frame routing.
//!
//! Every frame read off the push connection lands here. The envelope's
//! channel decides the handler; the engine lock is taken once per frame
//! so processing stays strictly sequential.

use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::{
    dto::{
        event::{EVT_BOARD, EVT_LOBBY},
        snapshot::MatchSnapshot,
        upstream::{
            CHANNEL_BOARDS, CHANNEL_LOBBIES, CHANNEL_MATCHES, CHANNEL_USERS, ChannelEvent,
            Envelope, LobbyFrame, LobbyPlayer,
        },
    },
    engine::{Variant, variants},
    services::{broadcast, legs, lifecycle},
    state::SharedState,
    upstream::{UpstreamLink, api},
};

/// Route one raw frame from the push connection.
pub async fn route_frame(state: &SharedState, link: &UpstreamLink, raw: &str) {
    let envelope: Envelope = match serde_json::from_str(raw) {
        Ok(envelope) => envelope,
        Err(err) => {
            debug!(error = %err, "unparsable push frame");
            return;
        }
    };

    match envelope.channel.as_deref() {
        Some(CHANNEL_MATCHES) => handle_match_frame(state, envelope.data).await,
        Some(CHANNEL_BOARDS) => handle_board_event(state, link, envelope.data).await,
        Some(CHANNEL_USERS) => handle_user_event(state, link, envelope.data).await,
        Some(CHANNEL_LOBBIES) => handle_lobby_frame(state, link, envelope.data).await,
        other => debug!(channel = ?other, "frame on an unhandled channel"),
    }
}

/// Process a full match-state frame into a scoreboard event.
async fn handle_match_frame(state: &SharedState, data: Value) {
    let Some(match_id) = data.get("id").and_then(Value::as_str).map(str::to_string) else {
        return;
    };

    // The in-progress turn's id and timestamp churn on every poll even
    // when nothing visible changed; blank them so deduplication works on
    // scoreboard content alone.
    let mut dedup_key = data.clone();
    if let Some(turn) = dedup_key
        .get_mut("turns")
        .and_then(Value::as_array_mut)
        .and_then(|turns| turns.first_mut())
        .and_then(Value::as_object_mut)
    {
        turn.insert("id".into(), Value::Null);
        turn.insert("createdAt".into(), Value::Null);
    }

    let mut engine = state.engine().lock().await;
    if !engine.accept_frame(&match_id, &dedup_key) {
        return;
    }

    let snap: MatchSnapshot = match serde_json::from_value(data) {
        Ok(snap) => snap,
        Err(err) => {
            warn!(error = %err, match_id = %match_id, "malformed match frame");
            return;
        }
    };
    let Some(variant) = Variant::parse(&snap.variant) else {
        warn!(variant = %snap.variant, "frame for an unsupported variant");
        return;
    };

    // Frames can precede the lifecycle fetch (or the match was resumed
    // without one); seed identities from the frame itself.
    if engine.players.is_empty() {
        lifecycle::seed_player_cache(state, &mut engine, &snap).await;
    }

    if snap.game_finished {
        legs::record_finished_leg(&mut engine, state.stats_store().await, &snap).await;
    }

    let event = variants::process(variant, &mut engine, &snap);
    engine.set_last_event(event.clone());
    drop(engine);

    broadcast::publish_game_event(state, &event);
}

/// Handle board lifecycle and hardware status events.
async fn handle_board_event(state: &SharedState, link: &UpstreamLink, data: Value) {
    let event: ChannelEvent = match serde_json::from_value(data) {
        Ok(event) => event,
        Err(err) => {
            debug!(error = %err, "malformed board event");
            return;
        }
    };

    match (event.event.as_deref(), event.id.as_deref()) {
        (Some("start"), Some(id)) => {
            let mut engine = state.engine().lock().await;
            if let Err(err) = lifecycle::start_match(state, &mut engine, link, id).await {
                warn!(error = %err, match_id = %id, "could not start following match");
                engine.end_match();
            }
        }
        (Some("finish") | Some("delete"), id) => {
            let mut engine = state.engine().lock().await;
            let ours = match (id, engine.active_match_id()) {
                (Some(id), Some(active)) => id == active,
                (None, Some(_)) => true,
                _ => false,
            };
            if ours {
                lifecycle::finish_match(state, &mut engine);
            }
        }
        (Some(status), _) => match board_status_label(status) {
            Some(label) => broadcast::publish_value(
                state,
                &json!({"event": EVT_BOARD, "data": {"status": label}}),
            ),
            None => debug!(%status, "unmapped board status"),
        },
        (None, _) => {}
    }
}

/// Display label for a raw board hardware status.
fn board_status_label(status: &str) -> Option<&'static str> {
    Some(match status {
        "Takeout started" => "Takeout Started",
        "Takeout finished" => "Takeout Finished",
        "Manual reset" => "Manual reset",
        "Stopped" => "Board Stopped",
        "Started" => "Board Started",
        "Calibration started" => "Calibration Started",
        "Calibration finished" => "Calibration Finished",
        _ => return None,
    })
}

/// Handle account-scoped events, i.e. our own lobby membership.
async fn handle_user_event(state: &SharedState, link: &UpstreamLink, data: Value) {
    let event: ChannelEvent = match serde_json::from_value(data) {
        Ok(event) => event,
        Err(_) => return,
    };
    let lobby_id = event
        .body
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string);

    match (event.event.as_deref(), lobby_id) {
        (Some("lobby-enter"), Some(id)) => {
            let mut engine = state.engine().lock().await;
            engine.begin_lobby(&id);
            link.subscribe(CHANNEL_LOBBIES, format!("{id}.state"));
            link.subscribe(CHANNEL_LOBBIES, format!("{id}.events"));
        }
        (Some("lobby-leave"), Some(id)) => {
            let mut engine = state.engine().lock().await;
            unfollow_lobby(&mut engine, link, &id);
        }
        _ => {}
    }
}

/// Handle lobby lifecycle events and roster updates.
async fn handle_lobby_frame(state: &SharedState, link: &UpstreamLink, data: Value) {
    let frame: LobbyFrame = match serde_json::from_value(data) {
        Ok(frame) => frame,
        Err(_) => return,
    };

    if let Some(event) = frame.event.as_deref() {
        match event {
            // The lobby turned into a match; its diagnostic noise is done.
            "start" => state.clear_raw_frames().await,
            "finish" | "delete" => {
                let mut engine = state.engine().lock().await;
                let id = frame.id.or_else(|| followed_lobby_id(&engine));
                if let Some(id) = id {
                    unfollow_lobby(&mut engine, link, &id);
                }
                engine.players.clear();
            }
            _ => {}
        }
        return;
    }

    let Some(roster) = frame.players else {
        return;
    };

    let mut engine = state.engine().lock().await;
    let board_id = &state.config().board_id;

    // A roster without our board means we were removed; stop following.
    let ours = roster
        .iter()
        .any(|player| player.board_id.as_deref() == Some(board_id.as_str()));
    if !ours {
        if let Some(id) = frame.id.or_else(|| followed_lobby_id(&engine)) {
            unfollow_lobby(&mut engine, link, &id);
        }
        return;
    }

    let (removed, added) = diff_roster(&engine.lobby_players, &roster);
    for player in removed {
        if let Some(name) = player.name {
            broadcast::publish_value(
                state,
                &json!({"event": EVT_LOBBY, "action": "player-left", "player": name.to_lowercase()}),
            );
        }
    }
    // One join notice per update is enough for the display.
    for player in added {
        if player.board_id.as_deref() == Some(board_id.as_str()) {
            continue;
        }
        let Some(name) = player.name else { continue };
        let average = match &player.user_id {
            Some(user_id) => api::user_x01_average(state, user_id)
                .await
                .ok()
                .flatten()
                .map(|avg| avg.ceil().to_string())
                .unwrap_or_else(|| "N/A".into()),
            None => "N/A".into(),
        };
        broadcast::publish_value(
            state,
            &json!({
                "event": EVT_LOBBY,
                "action": "player-joined",
                "player": name,
                "average": average,
            }),
        );
        break;
    }

    engine.lobby_players = roster;
}

/// Identifier of the lobby currently followed, when one is.
fn followed_lobby_id(engine: &crate::engine::MatchEngine) -> Option<String> {
    engine
        .active_match_id()
        .and_then(|id| id.strip_prefix("lobby:"))
        .map(str::to_string)
}

fn unfollow_lobby(engine: &mut crate::engine::MatchEngine, link: &UpstreamLink, id: &str) {
    link.unsubscribe(CHANNEL_LOBBIES, format!("{id}.state"));
    link.unsubscribe(CHANNEL_LOBBIES, format!("{id}.events"));
    engine.end_lobby();
}

/// Roster difference keyed by account id, falling back to name for
/// anonymous entries.
fn diff_roster(old: &[LobbyPlayer], new: &[LobbyPlayer]) -> (Vec<LobbyPlayer>, Vec<LobbyPlayer>) {
    fn key(player: &LobbyPlayer) -> (Option<&str>, Option<&str>) {
        match player.user_id.as_deref() {
            Some(id) => (Some(id), None),
            None => (None, player.name.as_deref()),
        }
    }

    let removed = old
        .iter()
        .filter(|player| !new.iter().any(|other| key(other) == key(player)))
        .cloned()
        .collect();
    let added = new
        .iter()
        .filter(|player| !old.iter().any(|other| key(other) == key(player)))
        .cloned()
        .collect();
    (removed, added)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(name: &str, user_id: Option<&str>) -> LobbyPlayer {
        LobbyPlayer {
            name: Some(name.into()),
            user_id: user_id.map(Into::into),
            board_id: None,
        }
    }

    #[test]
    fn roster_diff_by_account_id() {
        let old = vec![player("Ann", Some("u1")), player("Bob", Some("u2"))];
        let new = vec![player("Ann", Some("u1")), player("Cay", Some("u3"))];
        let (removed, added) = diff_roster(&old, &new);
        assert_eq!(removed, vec![player("Bob", Some("u2"))]);
        assert_eq!(added, vec![player("Cay", Some("u3"))]);
    }

    #[test]
    fn roster_diff_falls_back_to_names_for_anonymous_players() {
        let old = vec![player("Walk-in", None)];
        let new = vec![player("Walk-in", None), player("Late", None)];
        let (removed, added) = diff_roster(&old, &new);
        assert!(removed.is_empty());
        assert_eq!(added, vec![player("Late", None)]);
    }

    #[test]
    fn renamed_account_counts_as_the_same_player() {
        let old = vec![player("Ann", Some("u1"))];
        let new = vec![player("Annie", Some("u1"))];
        let (removed, added) = diff_roster(&old, &new);
        assert!(removed.is_empty());
        assert!(added.is_empty());
    }

    #[test]
    fn board_statuses_map_to_display_labels() {
        assert_eq!(board_status_label("Takeout started"), Some("Takeout Started"));
        assert_eq!(board_status_label("Stopped"), Some("Board Stopped"));
        assert_eq!(board_status_label("Calibration finished"), Some("Calibration Finished"));
        assert_eq!(board_status_label("Rebooting"), None);
    }
}
