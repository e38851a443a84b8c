//! Around the Clock: every player walks their own target sequence.

use serde_json::Value;

use crate::dto::{
    event::{GameEvent, MatchRules, RoundTarget},
    snapshot::{MatchSnapshot, SnapshotState},
};

pub(super) fn apply(snap: &MatchSnapshot, event: &mut GameEvent) {
    event.rules = MatchRules {
        order: snap.settings.order.clone(),
        hits_per_target: snap.settings.hits.unwrap_or(0),
        scoring_mode: snap.settings.mode.clone(),
        ..MatchRules::for_mode("ATC", event.rules.use_db)
    };

    for (i, row) in event.players.iter_mut().enumerate() {
        let stats = snap.stats_for(i);
        row.leg_hit_rate = stats.leg_stats.hit_rate;
        row.match_hit_rate = stats.match_stats.hit_rate;
        row.current_target = Some(personal_target(&snap.state, i));
    }

    // The round target is whatever the thrower is currently chasing.
    event.turn.target = event
        .players
        .get(event.current_player_index)
        .and_then(|row| row.current_target.clone())
        .map(RoundTarget::Label);

    super::demote_match_win(event);
}

/// Target label for player `i`, `?` when the progress data is incoherent.
fn personal_target(state: &SnapshotState, i: usize) -> String {
    let resolved = state
        .current_targets
        .get(i)
        .and_then(|idx| usize::try_from(*idx).ok())
        .and_then(|idx| state.targets.get(i)?.get(idx))
        .and_then(|entry| entry.get("number"))
        .and_then(Value::as_i64);
    match resolved {
        Some(25) => "Bull".into(),
        Some(number) => number.to_string(),
        None => "?".into(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::engine::testutil::{engine_for, snapshot};
    use crate::engine::{Variant, variants::process};
    use crate::dto::event::RoundTarget;

    #[test]
    fn each_player_carries_their_own_target() {
        let mut engine = engine_for(&["Ann", "Bob"]);
        let mut snap = snapshot("ATC", &["Ann", "Bob"]);
        snap.settings.order = Some("1-20-Bull".into());
        snap.settings.hits = Some(1);
        snap.state.current_targets = vec![2, 0];
        snap.state.targets = json!([
            [{"number": 1}, {"number": 2}, {"number": 25}],
            [{"number": 1}, {"number": 2}, {"number": 25}],
        ]);
        snap.player = 1;

        let event = process(Variant::Atc, &mut engine, &snap);
        assert_eq!(event.players[0].current_target.as_deref(), Some("Bull"));
        assert_eq!(event.players[1].current_target.as_deref(), Some("1"));
        assert_eq!(event.turn.target, Some(RoundTarget::label("1")));
    }

    #[test]
    fn incoherent_progress_shows_question_mark() {
        let mut engine = engine_for(&["Ann"]);
        let mut snap = snapshot("ATC", &["Ann"]);
        snap.state.current_targets = vec![9];
        snap.state.targets = json!([[{"number": 1}]]);

        let event = process(Variant::Atc, &mut engine, &snap);
        assert_eq!(event.players[0].current_target.as_deref(), Some("?"));
    }
}
