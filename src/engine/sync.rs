//! Variant-independent scoreboard assembly.
//!
//! Builds the shared [`GameEvent`] frame every processor starts from:
//! rules from the snapshot settings, turn state from the newest turn
//! record, one scoreboard row per player with latched seats and cached
//! lifetime statistics, and the winner annotation.
//!
//! Winner resolution is deliberately asymmetric. A match winner index
//! refers to the creation-time seating and is resolved through the
//! identity cache (yielding the lowercased cached name); a leg winner
//! index refers to the rotated roster of the frame itself.

use crate::dto::{
    event::{
        EVT_GAME_UPDATE, GameEvent, GameState, MatchRules, PlayerState, TurnState, WinKind,
        WinnerInfo,
    },
    snapshot::MatchSnapshot,
};

use super::MatchEngine;

/// Assemble the variant-independent scoreboard frame.
pub fn build_game_event(engine: &mut MatchEngine, snap: &MatchSnapshot) -> GameEvent {
    let settings = &snap.settings;
    let rules = MatchRules {
        game_mode: settings
            .game_mode
            .clone()
            .unwrap_or_else(|| snap.variant.clone()),
        use_db: engine.use_db(),
        legs_to_win: snap.legs,
        sets_to_win: snap.sets,
        max_rounds: settings.max_rounds,
        start_score: settings.base_score,
        in_mode: settings.in_mode.clone(),
        out_mode: settings.out_mode.clone(),
        ..MatchRules::default()
    };

    let turn = match snap.first_turn() {
        Some(record) => TurnState {
            current_round: snap.round,
            current_leg: snap.leg,
            current_set: snap.set,
            target: None,
            throws: record.throws.clone(),
            busted: record.busted,
        },
        None => TurnState {
            current_round: snap.round,
            current_leg: snap.leg,
            current_set: snap.set,
            ..TurnState::default()
        },
    };

    let mut players = Vec::with_capacity(snap.players.len());
    for (i, player) in snap.players.iter().enumerate() {
        let order = engine.players.latch_display_order(&player.name, i);
        let cached = engine.players.get(&player.name).cloned().unwrap_or_default();
        let stats = snap.stats_for(i);
        players.push(PlayerState {
            name: player.name.clone(),
            player_type: cached.kind,
            display_order: Some(order),
            score: snap.score_for(i).into(),
            legs_won: snap.legs_for(i),
            sets_won: snap.sets_for(i),
            leg_average: stats.leg_stats.average,
            match_average: stats.match_stats.average,
            overall_average: cached.average,
            overall_mpr: cached.mpr,
            overall_hit_rate: cached.hit_rate,
            overall_ppr: cached.ppr,
            ..PlayerState::default()
        });
    }

    let (game_state, winner_info) = decide_winner(engine, snap);

    GameEvent {
        event: EVT_GAME_UPDATE.into(),
        game_state,
        rules,
        turn,
        players,
        current_player_index: snap.player,
        winner_info,
        checkout_guide: snap.state.checkout_guide.clone(),
    }
}

/// Resolve the frame's winner annotation, if any.
fn decide_winner(engine: &MatchEngine, snap: &MatchSnapshot) -> (GameState, Option<WinnerInfo>) {
    if snap.winner >= 0 {
        let name = engine
            .players
            .name_for_stable_index(snap.winner)
            .unwrap_or_default()
            .to_string();
        return (
            GameState::MatchWon,
            Some(WinnerInfo {
                player: name,
                kind: WinKind::Match,
            }),
        );
    }
    if snap.game_winner >= 0 {
        let name = snap
            .players
            .get(snap.game_winner as usize)
            .map(|player| player.name.clone())
            .unwrap_or_default();
        return (
            GameState::LegWon,
            Some(WinnerInfo {
                player: name,
                kind: WinKind::Leg,
            }),
        );
    }
    (GameState::Throw, None)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::engine::testutil::{engine_for, snapshot};

    use super::*;

    #[test]
    fn seats_stay_latched_across_rotated_frames() {
        let mut engine = engine_for(&["Ann", "Bob"]);

        let first = snapshot("X01", &["Ann", "Bob"]);
        let event = build_game_event(&mut engine, &first);
        assert_eq!(event.players[0].display_order, Some(0));
        assert_eq!(event.players[1].display_order, Some(1));

        // Second leg: Bob throws first, seats must not move.
        let rotated = snapshot("X01", &["Bob", "Ann"]);
        let event = build_game_event(&mut engine, &rotated);
        assert_eq!(event.players[0].name, "Bob");
        assert_eq!(event.players[0].display_order, Some(1));
        assert_eq!(event.players[1].display_order, Some(0));
    }

    #[test]
    fn match_winner_resolves_through_stable_index() {
        let mut engine = engine_for(&["Ann", "Bob"]);
        // Rotated final frame: stable index 0 is Ann even though Bob is
        // listed first.
        let mut snap = snapshot("X01", &["Bob", "Ann"]);
        snap.winner = 0;

        let event = build_game_event(&mut engine, &snap);
        assert_eq!(event.game_state, GameState::MatchWon);
        let info = event.winner_info.unwrap();
        assert_eq!(info.player, "ann");
        assert_eq!(info.kind, WinKind::Match);
    }

    #[test]
    fn unknown_stable_index_yields_empty_winner_name() {
        let mut engine = engine_for(&["Ann"]);
        let mut snap = snapshot("X01", &["Ann"]);
        snap.winner = 9;

        let event = build_game_event(&mut engine, &snap);
        assert_eq!(event.game_state, GameState::MatchWon);
        assert_eq!(event.winner_info.unwrap().player, "");
    }

    #[test]
    fn leg_winner_resolves_through_rotated_roster() {
        let mut engine = engine_for(&["Ann", "Bob"]);
        let mut snap = snapshot("X01", &["Bob", "Ann"]);
        snap.game_winner = 0;

        let event = build_game_event(&mut engine, &snap);
        assert_eq!(event.game_state, GameState::LegWon);
        let info = event.winner_info.unwrap();
        assert_eq!(info.player, "Bob");
        assert_eq!(info.kind, WinKind::Leg);
    }

    #[test]
    fn missing_collections_default_to_zeroes() {
        let mut engine = engine_for(&["Ann"]);
        let snap = snapshot("X01", &["Ann"]);

        let event = build_game_event(&mut engine, &snap);
        assert_eq!(event.game_state, GameState::Throw);
        assert_eq!(event.players[0].score.points(), 0);
        assert_eq!(event.players[0].legs_won, 0);
        assert!(event.turn.throws.is_empty());
    }

    #[test]
    fn turn_carries_raw_throws_and_bust_flag() {
        let mut engine = engine_for(&["Ann"]);
        let mut snap = snapshot("X01", &["Ann"]);
        snap.round = 3;
        snap.turns = vec![crate::dto::snapshot::TurnRecord {
            throws: vec![json!({"segment": {"number": 20, "bed": "Triple"}})],
            busted: true,
            ..Default::default()
        }];

        let event = build_game_event(&mut engine, &snap);
        assert_eq!(event.turn.current_round, 3);
        assert!(event.turn.busted);
        assert_eq!(event.turn.throws.len(), 1);
    }
}
