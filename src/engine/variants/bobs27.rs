//! Bob's 27: doubles ladder from D1 to D20, optionally finishing on the
//! bull.

use crate::dto::{
    event::{GameEvent, GameState, MatchRules, RoundTarget},
    snapshot::MatchSnapshot,
};

pub(super) fn apply(snap: &MatchSnapshot, event: &mut GameEvent) {
    let order = snap
        .settings
        .order
        .clone()
        .unwrap_or_else(|| "1-20-Bull".into());
    let with_bull = order.contains("Bull");

    event.rules = MatchRules {
        scoring_mode: Some(snap.settings.mode.clone().unwrap_or_else(|| "Normal".into())),
        order: Some(order),
        max_rounds: 21,
        ..MatchRules::for_mode("Bob's 27", event.rules.use_db)
    };

    let round = event.turn.current_round;
    let label = if round <= 20 {
        format!("D{round}")
    } else if round == 21 && with_bull {
        "Bullseye".into()
    } else {
        "Game Over".into()
    };
    event.turn.target = Some(RoundTarget::Label(label));

    // Going below zero ends the game immediately; otherwise it runs until
    // the ladder is exhausted.
    let rounds_played_cap = if with_bull { 21 } else { 20 };
    if event.turn.busted {
        event.game_state = GameState::Busted;
    } else if snap.game_finished || round > rounds_played_cap {
        event.game_state = GameState::GameOver;
    }

    super::demote_match_win(event);
}

#[cfg(test)]
mod tests {
    use crate::engine::testutil::{engine_for, snapshot};
    use crate::engine::{Variant, variants::process};
    use crate::dto::event::RoundTarget;
    use crate::dto::snapshot::TurnRecord;

    use super::*;

    #[test]
    fn ladder_targets_follow_the_round() {
        let mut engine = engine_for(&["Ann"]);
        let mut snap = snapshot("Bob's 27", &["Ann"]);
        snap.settings.order = Some("1-20-Bull".into());

        snap.round = 7;
        let event = process(Variant::Bobs27, &mut engine, &snap);
        assert_eq!(event.turn.target, Some(RoundTarget::label("D7")));

        snap.round = 21;
        let event = process(Variant::Bobs27, &mut engine, &snap);
        assert_eq!(event.turn.target, Some(RoundTarget::label("Bullseye")));
        assert_eq!(event.game_state, GameState::Throw);
    }

    #[test]
    fn bust_ends_the_game_immediately() {
        let mut engine = engine_for(&["Ann"]);
        let mut snap = snapshot("Bob's 27", &["Ann"]);
        snap.turns = vec![TurnRecord {
            busted: true,
            ..TurnRecord::default()
        }];

        let event = process(Variant::Bobs27, &mut engine, &snap);
        assert_eq!(event.game_state, GameState::Busted);
    }

    #[test]
    fn running_past_the_ladder_is_game_over() {
        let mut engine = engine_for(&["Ann"]);
        let mut snap = snapshot("Bob's 27", &["Ann"]);
        snap.settings.order = Some("1-20".into());
        snap.round = 21;

        let event = process(Variant::Bobs27, &mut engine, &snap);
        assert_eq!(event.turn.target, Some(RoundTarget::label("Game Over")));
        assert_eq!(event.game_state, GameState::GameOver);
    }
}
