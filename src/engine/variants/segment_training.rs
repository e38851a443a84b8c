//! Segment practice: hammer one segment until a hit or dart budget runs
//! out.

use crate::dto::{
    event::{GameEvent, MatchRules, RoundTarget},
    snapshot::MatchSnapshot,
};

pub(super) fn apply(snap: &MatchSnapshot, event: &mut GameEvent) {
    let (ends_after_type, ends_after_value) = match snap.settings.hits {
        Some(hits) if hits > 0 => ("hits", hits),
        _ => ("darts", snap.settings.throws.unwrap_or(0)),
    };
    event.rules = MatchRules {
        ends_after_type: Some(ends_after_type.into()),
        ends_after_value,
        ..MatchRules::for_mode("Segment Training", event.rules.use_db)
    };

    // Structured target: the client renders segment and bed separately.
    event.turn.target = snap.state.target.as_ref().map(|target| RoundTarget::Segment {
        segment: target.number,
        mode: target.bed.clone(),
    });

    for (i, row) in event.players.iter_mut().enumerate() {
        let stats = snap.stats_for(i);
        row.darts_thrown_leg = stats.leg_stats.darts_thrown;
        row.leg_hit_rate = stats.leg_stats.hit_rate;
        row.match_hit_rate = stats.match_stats.hit_rate;
    }

    super::demote_match_win(event);
}

#[cfg(test)]
mod tests {
    use crate::engine::testutil::{engine_for, snapshot};
    use crate::engine::{Variant, variants::process};
    use crate::dto::event::RoundTarget;
    use crate::dto::snapshot::SegmentTarget;

    #[test]
    fn hit_budget_wins_over_dart_budget() {
        let mut engine = engine_for(&["Ann"]);
        let mut snap = snapshot("Segment Training", &["Ann"]);
        snap.settings.hits = Some(30);
        snap.settings.throws = Some(99);

        let event = process(Variant::SegmentTraining, &mut engine, &snap);
        assert_eq!(event.rules.ends_after_type.as_deref(), Some("hits"));
        assert_eq!(event.rules.ends_after_value, 30);
    }

    #[test]
    fn dart_budget_applies_when_no_hit_budget() {
        let mut engine = engine_for(&["Ann"]);
        let mut snap = snapshot("Segment Training", &["Ann"]);
        snap.settings.throws = Some(60);

        let event = process(Variant::SegmentTraining, &mut engine, &snap);
        assert_eq!(event.rules.ends_after_type.as_deref(), Some("darts"));
        assert_eq!(event.rules.ends_after_value, 60);
    }

    #[test]
    fn target_is_structured_segment_and_bed() {
        let mut engine = engine_for(&["Ann"]);
        let mut snap = snapshot("Segment Training", &["Ann"]);
        snap.state.target = Some(SegmentTarget {
            number: Some(19),
            bed: Some("Triple".into()),
        });

        let event = process(Variant::SegmentTraining, &mut engine, &snap);
        assert_eq!(
            event.turn.target,
            Some(RoundTarget::Segment {
                segment: Some(19),
                mode: Some("Triple".into()),
            })
        );
    }
}
