//! Shanghai: one numbered segment per round.

use serde_json::Value;

use crate::dto::{
    event::{GameEvent, RoundTarget},
    snapshot::MatchSnapshot,
};

pub(super) fn apply(snap: &MatchSnapshot, event: &mut GameEvent) {
    let label = usize::try_from(event.turn.current_round - 1)
        .ok()
        .and_then(|idx| snap.state.targets.get(idx))
        .and_then(Value::as_i64)
        .map(|number| number.to_string())
        .unwrap_or_else(|| "N/A".into());
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
    fn round_target_is_the_scheduled_number() {
        let mut engine = engine_for(&["Ann"]);
        let mut snap = snapshot("Shanghai", &["Ann"]);
        snap.state.targets = json!([1, 2, 3]);
        snap.round = 2;

        let event = process(Variant::Shanghai, &mut engine, &snap);
        assert_eq!(event.turn.target, Some(RoundTarget::label("2")));
    }

    #[test]
    fn rounds_past_the_schedule_show_na() {
        let mut engine = engine_for(&["Ann"]);
        let mut snap = snapshot("Shanghai", &["Ann"]);
        snap.state.targets = json!([1, 2, 3]);
        snap.round = 4;

        let event = process(Variant::Shanghai, &mut engine, &snap);
        assert_eq!(event.turn.target, Some(RoundTarget::label("N/A")));
    }
}
