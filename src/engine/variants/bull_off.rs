//! Opening bull-off round deciding throw order.

use crate::dto::{
    event::{GameEvent, GameState, MatchRules, ScoreValue, WinKind, WinnerInfo},
    snapshot::MatchSnapshot,
};

use crate::engine::MatchEngine;

pub(super) fn apply(engine: &mut MatchEngine, snap: &MatchSnapshot, event: &mut GameEvent) {
    event.rules = MatchRules::for_mode("Bull-off", event.rules.use_db);

    // No meaningful score during the bull-off; show a placeholder.
    for row in &mut event.players {
        if row.score == ScoreValue::Points(0) {
            row.score = ScoreValue::Text("-".into());
        }
    }

    // Completion is detected by every player having dart coordinates, the
    // winner index alone is not enough to tell a tie from an open round.
    let thrown = (0..snap.players.len())
        .filter(|&i| snap.stats_for(i).leg_stats.coords.is_some())
        .count();
    if thrown != snap.players.len() {
        return;
    }

    // The real match latches fresh seats once the bull-off is over.
    engine.players.reset_display_orders();

    if snap.game_winner >= 0 {
        let winner_index = snap.game_winner as usize;
        let winner = snap
            .players
            .get(winner_index)
            .map(|player| player.name.clone())
            .unwrap_or_default();
        event.game_state = GameState::LegWon;
        event.winner_info = Some(WinnerInfo {
            player: winner.clone(),
            kind: WinKind::BullOff,
        });
        event.current_player_index = winner_index;
        engine.set_bull_off_winner(Some(winner));
    } else {
        event.game_state = GameState::BullOffTie;
        engine.set_bull_off_winner(None);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::engine::testutil::{engine_for, snapshot};
    use crate::engine::{Variant, variants::process};
    use crate::dto::snapshot::{PlayerStatsRecord, StatBlock};

    use super::*;

    fn thrown_stats() -> PlayerStatsRecord {
        PlayerStatsRecord {
            leg_stats: StatBlock {
                coords: Some(json!({"x": 0.1, "y": -0.2})),
                ..StatBlock::default()
            },
            ..PlayerStatsRecord::default()
        }
    }

    #[test]
    fn open_round_shows_placeholders_and_no_winner() {
        let mut engine = engine_for(&["Ann", "Bob"]);
        let mut snap = snapshot("Bull-off", &["Ann", "Bob"]);
        snap.stats = vec![thrown_stats(), PlayerStatsRecord::default()];

        let event = process(Variant::BullOff, &mut engine, &snap);
        assert_eq!(event.game_state, GameState::Throw);
        assert_eq!(event.players[0].score, ScoreValue::Text("-".into()));
        assert!(engine.bull_off_winner().is_none());
    }

    #[test]
    fn completed_round_declares_the_winner_and_resets_seats() {
        let mut engine = engine_for(&["Ann", "Bob"]);
        engine.players.latch_display_order("Ann", 0);
        engine.players.latch_display_order("Bob", 1);

        let mut snap = snapshot("Bull-off", &["Ann", "Bob"]);
        snap.stats = vec![thrown_stats(), thrown_stats()];
        snap.game_winner = 1;

        let event = process(Variant::BullOff, &mut engine, &snap);
        assert_eq!(event.game_state, GameState::LegWon);
        let info = event.winner_info.clone().unwrap();
        assert_eq!(info.player, "Bob");
        assert_eq!(info.kind, WinKind::BullOff);
        assert_eq!(event.current_player_index, 1);
        assert_eq!(engine.bull_off_winner(), Some("Bob"));

        // Seats were forgotten; the first match frame latches fresh ones.
        assert_eq!(engine.players.latch_display_order("Bob", 0), 0);
    }

    #[test]
    fn completed_round_without_winner_is_a_tie() {
        let mut engine = engine_for(&["Ann", "Bob"]);
        engine.set_bull_off_winner(Some("Ann".into()));

        let mut snap = snapshot("Bull-off", &["Ann", "Bob"]);
        snap.stats = vec![thrown_stats(), thrown_stats()];

        let event = process(Variant::BullOff, &mut engine, &snap);
        assert_eq!(event.game_state, GameState::BullOffTie);
        assert!(engine.bull_off_winner().is_none());
    }
}
