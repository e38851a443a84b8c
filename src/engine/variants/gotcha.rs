//! Gotcha: race to an exact target score.

use crate::dto::{
    event::{GameEvent, MatchRules},
    snapshot::MatchSnapshot,
};

pub(super) fn apply(snap: &MatchSnapshot, event: &mut GameEvent) {
    event.rules = MatchRules {
        start_score: snap.settings.target_score,
        out_mode: snap.settings.out_mode.clone(),
        max_rounds: snap.settings.max_rounds,
        ..MatchRules::for_mode("Gotcha", event.rules.use_db)
    };

    super::demote_match_win(event);
}

#[cfg(test)]
mod tests {
    use crate::engine::testutil::{engine_for, snapshot};
    use crate::engine::{Variant, variants::process};

    #[test]
    fn rules_carry_the_race_target() {
        let mut engine = engine_for(&["Ann"]);
        let mut snap = snapshot("Gotcha", &["Ann"]);
        snap.settings.target_score = 301;
        snap.settings.out_mode = Some("Straight".into());
        snap.settings.max_rounds = 20;

        let event = process(Variant::Gotcha, &mut engine, &snap);
        assert_eq!(event.rules.game_mode, "Gotcha");
        assert_eq!(event.rules.start_score, 301);
        assert_eq!(event.rules.out_mode.as_deref(), Some("Straight"));
        assert_eq!(event.rules.max_rounds, 20);
    }
}
