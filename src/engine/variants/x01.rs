//! Countdown play (301/501/701...).

use crate::dto::{
    event::{GameEvent, GameState, WinKind},
    snapshot::MatchSnapshot,
};

/// Promote a leg win to a match win in first-to-one-leg games.
///
/// Without leg or set tracking the decided leg IS the match, and clients
/// should show the match-over screen right away.
pub(super) fn apply(_snap: &MatchSnapshot, event: &mut GameEvent) {
    let first_to_one_leg = event.rules.legs_to_win == 0 || event.rules.legs_to_win == 1;

    if event.game_state == GameState::LegWon && first_to_one_leg && event.rules.sets_to_win == 0 {
        event.game_state = GameState::MatchWon;
        if let Some(info) = event.winner_info.as_mut() {
            info.kind = WinKind::Match;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::testutil::{engine_for, snapshot};
    use crate::engine::{Variant, variants::process};

    use super::*;

    #[test]
    fn first_to_one_leg_promotes_leg_win() {
        let mut engine = engine_for(&["Ann", "Bob"]);
        let mut snap = snapshot("X01", &["Ann", "Bob"]);
        snap.legs = 1;
        snap.game_winner = 1;

        let event = process(Variant::X01, &mut engine, &snap);
        assert_eq!(event.game_state, GameState::MatchWon);
        let info = event.winner_info.unwrap();
        assert_eq!(info.player, "Bob");
        assert_eq!(info.kind, WinKind::Match);
    }

    #[test]
    fn tracked_legs_leave_leg_wins_alone() {
        let mut engine = engine_for(&["Ann", "Bob"]);
        let mut snap = snapshot("X01", &["Ann", "Bob"]);
        snap.legs = 3;
        snap.game_winner = 0;

        let event = process(Variant::X01, &mut engine, &snap);
        assert_eq!(event.game_state, GameState::LegWon);
        assert_eq!(event.winner_info.unwrap().kind, WinKind::Leg);
    }

    #[test]
    fn set_play_leaves_leg_wins_alone() {
        let mut engine = engine_for(&["Ann", "Bob"]);
        let mut snap = snapshot("X01", &["Ann", "Bob"]);
        snap.legs = 1;
        snap.sets = 2;
        snap.game_winner = 0;

        let event = process(Variant::X01, &mut engine, &snap);
        assert_eq!(event.game_state, GameState::LegWon);
    }
}
