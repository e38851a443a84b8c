//! Bermuda: thirteen fixed rounds over a scripted target sequence.

use serde_json::Value;

use crate::dto::{
    event::{GameEvent, MatchRules, RoundTarget},
    snapshot::MatchSnapshot,
};

pub(super) fn apply(snap: &MatchSnapshot, event: &mut GameEvent) {
    event.rules = MatchRules {
        max_rounds: 13,
        ..MatchRules::for_mode("Bermuda", event.rules.use_db)
    };

    event.turn.target = Some(RoundTarget::label(round_label(
        &snap.state.targets,
        event.turn.current_round,
    )));

    super::demote_match_win(event);
}

/// Label for the scheduled target of `round`, `Game Over` past the script.
fn round_label(targets: &Value, round: i64) -> String {
    let Some(entry) = usize::try_from(round - 1)
        .ok()
        .and_then(|idx| targets.get(idx))
    else {
        return "Game Over".into();
    };
    let bed = entry.get("bed").and_then(Value::as_str).unwrap_or_default();
    let number = entry.get("number").and_then(Value::as_i64).unwrap_or(0);

    match (bed, number) {
        ("Single", n) if n > 0 => n.to_string(),
        ("Double", 25) => "Bullseye".into(),
        ("Double", _) => "Double".into(),
        ("Triple", _) => "Triple".into(),
        _ => "Game Over".into(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::engine::testutil::{engine_for, snapshot};
    use crate::engine::{Variant, variants::process};

    use super::*;

    #[test]
    fn round_labels_follow_the_script() {
        let targets = json!([
            {"bed": "Single", "number": 13},
            {"bed": "Double", "number": 0},
            {"bed": "Triple", "number": 0},
            {"bed": "Double", "number": 25},
        ]);
        assert_eq!(round_label(&targets, 1), "13");
        assert_eq!(round_label(&targets, 2), "Double");
        assert_eq!(round_label(&targets, 3), "Triple");
        assert_eq!(round_label(&targets, 4), "Bullseye");
        assert_eq!(round_label(&targets, 5), "Game Over");
    }

    #[test]
    fn rules_are_replaced_with_bermuda_defaults() {
        let mut engine = engine_for(&["Ann"]);
        let mut snap = snapshot("Bermuda", &["Ann"]);
        snap.settings.base_score = 501;

        let event = process(Variant::Bermuda, &mut engine, &snap);
        assert_eq!(event.rules.game_mode, "Bermuda");
        assert_eq!(event.rules.max_rounds, 13);
        assert_eq!(event.rules.start_score, 0);
    }
}
