//! Cricket and Tactics, which share scoring and only differ in the
//! segment set.

use crate::dto::{event::GameEvent, snapshot::MatchSnapshot};

/// Segment key the service uses for the bull.
const BULL_SEGMENT: &str = "25";
/// Label shown to clients for the bull.
const BULL_LABEL: &str = "bull";

pub(super) fn apply(snap: &MatchSnapshot, event: &mut GameEvent) {
    let targets: Vec<String> = snap
        .state
        .segments
        .keys()
        .map(|segment| display_label(segment))
        .collect();

    event.rules.max_rounds = snap.settings.max_rounds;
    event.rules.scoring_mode = snap.settings.scoring_mode.clone();
    event.rules.targets = targets;

    for (i, row) in event.players.iter_mut().enumerate() {
        row.mpr = snap.stats_for(i).leg_stats.mpr;
        row.hits = snap
            .state
            .segments
            .iter()
            .map(|(segment, counts)| {
                (
                    display_label(segment),
                    counts.get(i).copied().unwrap_or(0),
                )
            })
            .collect();
    }
}

fn display_label(segment: &str) -> String {
    if segment == BULL_SEGMENT {
        BULL_LABEL.to_string()
    } else {
        segment.to_string()
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::testutil::{engine_for, snapshot};
    use crate::engine::{Variant, variants::process};

    use crate::dto::snapshot::{PlayerStatsRecord, StatBlock};

    #[test]
    fn segments_become_targets_and_per_player_hits() {
        let mut engine = engine_for(&["Ann", "Bob"]);
        let mut snap = snapshot("Cricket", &["Ann", "Bob"]);
        snap.state.segments.insert("20".into(), vec![3, 1]);
        snap.state.segments.insert("25".into(), vec![0, 2]);
        snap.settings.scoring_mode = Some("Cut Throat".into());
        snap.stats = vec![
            PlayerStatsRecord {
                leg_stats: StatBlock {
                    mpr: 2.4,
                    ..StatBlock::default()
                },
                ..PlayerStatsRecord::default()
            },
            PlayerStatsRecord::default(),
        ];

        let event = process(Variant::Cricket, &mut engine, &snap);
        assert_eq!(event.rules.targets, vec!["20".to_string(), "bull".into()]);
        assert_eq!(event.rules.scoring_mode.as_deref(), Some("Cut Throat"));
        assert_eq!(event.players[0].mpr, 2.4);
        assert_eq!(event.players[0].hits["20"], 3);
        assert_eq!(event.players[1].hits["bull"], 2);
    }

    #[test]
    fn short_hit_lists_pad_with_zero() {
        let mut engine = engine_for(&["Ann", "Bob"]);
        let mut snap = snapshot("Tactics", &["Ann", "Bob"]);
        snap.state.segments.insert("19".into(), vec![1]);

        let event = process(Variant::Tactics, &mut engine, &snap);
        assert_eq!(event.players[1].hits["19"], 0);
    }
}
