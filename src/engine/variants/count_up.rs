//! Count Up: accumulate points over a fixed number of rounds.

use crate::dto::{
    event::{GameEvent, MatchRules},
    snapshot::MatchSnapshot,
};

pub(super) fn apply(snap: &MatchSnapshot, event: &mut GameEvent) {
    event.rules = MatchRules {
        max_rounds: snap.settings.max_rounds,
        ..MatchRules::for_mode("CountUp", event.rules.use_db)
    };

    super::demote_match_win(event);
}

#[cfg(test)]
mod tests {
    use crate::engine::testutil::{engine_for, snapshot};
    use crate::engine::{Variant, variants::process};

    #[test]
    fn rules_keep_only_the_round_cap() {
        let mut engine = engine_for(&["Ann"]);
        let mut snap = snapshot("CountUp", &["Ann"]);
        snap.settings.max_rounds = 8;
        snap.settings.base_score = 501;

        let event = process(Variant::CountUp, &mut engine, &snap);
        assert_eq!(event.rules.game_mode, "CountUp");
        assert_eq!(event.rules.max_rounds, 8);
        assert_eq!(event.rules.start_score, 0);
    }
}
