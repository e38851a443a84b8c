//! Round the World: shared target sequence, one segment per round.

use serde_json::Value;

use crate::dto::{
    event::{GameEvent, MatchRules, RoundTarget},
    snapshot::MatchSnapshot,
};

pub(super) fn apply(snap: &MatchSnapshot, event: &mut GameEvent) {
    event.rules = MatchRules {
        order: Some(
            snap.settings
                .order
                .clone()
                .unwrap_or_else(|| "1-20-Bull".into()),
        ),
        ..MatchRules::for_mode("RTW", event.rules.use_db)
    };

    let label = usize::try_from(event.turn.current_round - 1)
        .ok()
        .and_then(|idx| snap.state.targets.get(idx))
        .and_then(|entry| entry.get("number"))
        .and_then(Value::as_i64)
        .map(|number| {
            if number == 25 {
                "Bull".to_string()
            } else {
                number.to_string()
            }
        })
        .unwrap_or_else(|| "?".into());
    event.turn.target = Some(RoundTarget::label(label));

    super::demote_match_win(event);
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::engine::testutil::{engine_for, snapshot};
    use crate::engine::{Variant, variants::process};
    use crate::dto::event::RoundTarget;

    #[test]
    fn bull_round_is_labelled_bull() {
        let mut engine = engine_for(&["Ann"]);
        let mut snap = snapshot("RTW", &["Ann"]);
        snap.state.targets = json!([{"number": 20}, {"number": 25}]);
        snap.round = 2;

        let event = process(Variant::Rtw, &mut engine, &snap);
        assert_eq!(event.turn.target, Some(RoundTarget::label("Bull")));
        assert_eq!(event.rules.order.as_deref(), Some("1-20-Bull"));
    }

    #[test]
    fn out_of_schedule_rounds_show_question_mark() {
        let mut engine = engine_for(&["Ann"]);
        let mut snap = snapshot("RTW", &["Ann"]);
        snap.state.targets = json!([{"number": 20}]);
        snap.round = 5;

        let event = process(Variant::Rtw, &mut engine, &snap);
        assert_eq!(event.turn.target, Some(RoundTarget::label("?")));
    }
}
