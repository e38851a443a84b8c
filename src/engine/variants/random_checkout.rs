//! Random Checkout: random finish to clear, lowest remainder wins at the
//! round cap.

use crate::dto::{
    event::{GameEvent, GameState, MatchRules, WinKind, WinnerInfo},
    snapshot::MatchSnapshot,
};

pub(super) fn apply(snap: &MatchSnapshot, event: &mut GameEvent) {
    event.rules = MatchRules {
        out_mode: snap.settings.out_mode.clone(),
        max_rounds: snap.settings.max_rounds,
        ..MatchRules::for_mode("Random Checkout", event.rules.use_db)
    };

    // A decided game always ends as a leg win for the lowest remaining
    // score, covering both a checkout and the round cap running out.
    if snap.winner >= 0 {
        event.game_state = GameState::LegWon;
        let winner = event
            .players
            .iter()
            .min_by_key(|row| row.score.points())
            .map(|row| row.name.clone())
            .unwrap_or_default();
        event.winner_info = Some(WinnerInfo {
            player: winner,
            kind: WinKind::Leg,
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::testutil::{engine_for, snapshot};
    use crate::engine::{Variant, variants::process};

    use super::*;

    #[test]
    fn lowest_remaining_score_wins_at_the_cap() {
        let mut engine = engine_for(&["Ann", "Bob", "Cay"]);
        let mut snap = snapshot("Random Checkout", &["Ann", "Bob", "Cay"]);
        snap.game_scores = Some(vec![24, 9, 57]);
        snap.winner = 2; // upstream picked someone else; remainder decides

        let event = process(Variant::RandomCheckout, &mut engine, &snap);
        assert_eq!(event.game_state, GameState::LegWon);
        let info = event.winner_info.unwrap();
        assert_eq!(info.player, "Bob");
        assert_eq!(info.kind, WinKind::Leg);
    }

    #[test]
    fn undecided_frames_stay_throws() {
        let mut engine = engine_for(&["Ann", "Bob"]);
        let mut snap = snapshot("Random Checkout", &["Ann", "Bob"]);
        snap.game_scores = Some(vec![24, 9]);

        let event = process(Variant::RandomCheckout, &mut engine, &snap);
        assert_eq!(event.game_state, GameState::Throw);
        assert!(event.winner_info.is_none());
    }
}
