//! Match event processing core.
//!
//! [`MatchEngine`] owns every piece of per-match mutable state: the
//! active match id, the player identity cache, frame deduplication, leg
//! idempotency markers, and the lobby roster. The router locks it once
//! per inbound frame, so processing is strictly sequential.

pub mod players;
pub mod sync;
pub mod variant;
pub mod variants;

use std::collections::HashSet;

use serde_json::Value;

use crate::dto::{event::GameEvent, upstream::LobbyPlayer};

pub use players::{CachedPlayer, PlayerCache};
pub use variant::Variant;

/// Mutable processing state for the match currently followed.
#[derive(Debug, Default)]
pub struct MatchEngine {
    use_db: bool,
    active_match_id: Option<String>,
    /// Player identity cache for the running match.
    pub players: PlayerCache,
    processed_legs: HashSet<String>,
    last_payload: Option<Value>,
    last_event: Option<GameEvent>,
    /// Roster of the lobby currently followed, empty outside lobbies.
    pub lobby_players: Vec<LobbyPlayer>,
    bull_off_winner: Option<String>,
}

impl MatchEngine {
    /// New engine; `use_db` reflects whether a statistics store is configured.
    pub fn new(use_db: bool) -> Self {
        Self {
            use_db,
            ..Self::default()
        }
    }

    /// Whether leg statistics are persisted.
    pub fn use_db(&self) -> bool {
        self.use_db
    }

    /// Identifier of the match (or `lobby:<id>`) currently followed.
    pub fn active_match_id(&self) -> Option<&str> {
        self.active_match_id.as_deref()
    }

    /// Start following a match, dropping all state of the previous one.
    pub fn begin_match(&mut self, id: impl Into<String>) {
        self.active_match_id = Some(id.into());
        self.players.clear();
        self.processed_legs.clear();
        self.last_payload = None;
        self.last_event = None;
        self.bull_off_winner = None;
    }

    /// Stop following the current match.
    pub fn end_match(&mut self) {
        self.active_match_id = None;
        self.players.clear();
        self.last_payload = None;
        self.last_event = None;
        self.bull_off_winner = None;
    }

    /// Start following a lobby.
    pub fn begin_lobby(&mut self, lobby_id: &str) {
        self.active_match_id = Some(format!("lobby:{lobby_id}"));
        self.lobby_players.clear();
    }

    /// Stop following the current lobby.
    pub fn end_lobby(&mut self) {
        self.active_match_id = None;
        self.lobby_players.clear();
    }

    /// Gate one match frame: accepted only when it belongs to the active
    /// match and differs from the previous accepted frame.
    ///
    /// `payload` must already have the volatile turn fields blanked so
    /// byte-identical scoreboards deduplicate.
    pub fn accept_frame(&mut self, match_id: &str, payload: &Value) -> bool {
        if self.active_match_id.as_deref() != Some(match_id) {
            return false;
        }
        if self.last_payload.as_ref() == Some(payload) {
            return false;
        }
        self.last_payload = Some(payload.clone());
        true
    }

    /// Whether the given `<match>-<leg>` marker has already been persisted.
    pub fn leg_already_recorded(&self, marker: &str) -> bool {
        self.processed_legs.contains(marker)
    }

    /// Remember a persisted leg so retransmitted final frames are no-ops.
    pub fn mark_leg_recorded(&mut self, marker: String) {
        self.processed_legs.insert(marker);
    }

    /// Most recent event published to display clients.
    pub fn last_event(&self) -> Option<&GameEvent> {
        self.last_event.as_ref()
    }

    /// Cache the event just published, served to late-joining clients.
    pub fn set_last_event(&mut self, event: GameEvent) {
        self.last_event = Some(event);
    }

    /// Winner of the opening bull-off, when one has been decided.
    pub fn bull_off_winner(&self) -> Option<&str> {
        self.bull_off_winner.as_deref()
    }

    /// Record (or clear, on a tie) the bull-off winner.
    pub fn set_bull_off_winner(&mut self, winner: Option<String>) {
        self.bull_off_winner = winner;
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use crate::dto::snapshot::{MatchPlayer, MatchSnapshot, PlayerStatsRecord};

    use super::{CachedPlayer, MatchEngine};

    /// Snapshot with named players and zeroed statistics.
    pub fn snapshot(variant: &str, names: &[&str]) -> MatchSnapshot {
        MatchSnapshot {
            id: "match-1".into(),
            variant: variant.into(),
            players: names
                .iter()
                .enumerate()
                .map(|(i, name)| MatchPlayer {
                    name: (*name).into(),
                    index: Some(i as i64),
                    ..MatchPlayer::default()
                })
                .collect(),
            stats: names.iter().map(|_| PlayerStatsRecord::default()).collect(),
            ..MatchSnapshot::default()
        }
    }

    /// Engine following `match-1` with every named player cached.
    pub fn engine_for(names: &[&str]) -> MatchEngine {
        let mut engine = MatchEngine::new(true);
        engine.begin_match("match-1");
        for (i, name) in names.iter().enumerate() {
            engine.players.insert(
                name,
                CachedPlayer {
                    stable_index: Some(i as i64),
                    ..CachedPlayer::default()
                },
            );
        }
        engine
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn frames_for_other_matches_are_rejected() {
        let mut engine = MatchEngine::new(false);
        engine.begin_match("m-1");
        assert!(!engine.accept_frame("m-2", &json!({"round": 1})));
        assert!(engine.accept_frame("m-1", &json!({"round": 1})));
    }

    #[test]
    fn identical_frames_deduplicate() {
        let mut engine = MatchEngine::new(false);
        engine.begin_match("m-1");
        let frame = json!({"round": 1, "player": 0});
        assert!(engine.accept_frame("m-1", &frame));
        assert!(!engine.accept_frame("m-1", &frame));
        assert!(engine.accept_frame("m-1", &json!({"round": 1, "player": 1})));
    }

    #[test]
    fn leg_markers_survive_until_next_match() {
        let mut engine = MatchEngine::new(false);
        engine.begin_match("m-1");
        engine.mark_leg_recorded("m-1-1".into());
        assert!(engine.leg_already_recorded("m-1-1"));
        engine.begin_match("m-2");
        assert!(!engine.leg_already_recorded("m-1-1"));
    }
}
