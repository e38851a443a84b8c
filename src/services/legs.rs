//! Leg statistics recording.
//!
//! When a frame arrives with the leg finished, every player's per-leg
//! counters are written to the statistics store exactly once and the
//! refreshed lifetime aggregates flow back into the player cache so the
//! next frame already displays them.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    dao::stats_store::{LegCounters, LegEntry, StatFamily, StatsStore},
    dto::snapshot::MatchSnapshot,
    engine::{MatchEngine, Variant},
};

/// Record a finished leg, idempotently per match and leg number.
///
/// Failures leave the leg unmarked so a later frame for the same leg can
/// retry the write.
pub async fn record_finished_leg(
    engine: &mut MatchEngine,
    store: Option<Arc<StatsStore>>,
    snap: &MatchSnapshot,
) {
    let Some(store) = store else {
        return;
    };
    let Some(family) = Variant::parse(&snap.variant).and_then(Variant::stat_family) else {
        return;
    };

    let marker = format!("{}-{}", snap.id, snap.leg);
    if engine.leg_already_recorded(&marker) {
        return;
    }

    let entries = leg_entries(family, snap);
    if entries.is_empty() {
        return;
    }

    match store.record_leg(family, &snap.id, snap.leg, &entries).await {
        Ok(aggregates) => {
            for aggregate in aggregates {
                engine
                    .players
                    .set_overall(family, &aggregate.name, aggregate.value);
            }
            engine.mark_leg_recorded(marker);
            debug!(match_id = %snap.id, leg = snap.leg, "leg statistics recorded");
        }
        Err(err) => {
            warn!(error = %err, match_id = %snap.id, leg = snap.leg, "leg recording failed");
        }
    }
}

/// Build the per-player leg entries, skipping placeholder players.
fn leg_entries(family: StatFamily, snap: &MatchSnapshot) -> Vec<LegEntry> {
    let mut entries = Vec::with_capacity(snap.players.len());
    for (i, player) in snap.players.iter().enumerate() {
        if player.name.is_empty() || player.name.to_lowercase().starts_with("test") {
            continue;
        }

        let stats = snap.stats_for(i);
        let counters = match family {
            StatFamily::X01 => LegCounters::X01 {
                average: stats.leg_stats.average,
                points: stats.leg_stats.score,
                darts: stats.leg_stats.darts_thrown,
            },
            StatFamily::Cricket | StatFamily::Tactics => LegCounters::Marks {
                marks: marks_for(snap, i),
                darts: stats.leg_stats.darts_thrown,
            },
            StatFamily::Atc | StatFamily::SegmentTraining => LegCounters::HitRate {
                rate: stats.leg_stats.hit_rate,
                darts: stats.leg_stats.darts_thrown,
            },
            StatFamily::CountUp => LegCounters::Points {
                points: stats.leg_stats.score,
                darts: stats.leg_stats.darts_thrown,
            },
        };

        // Signed-in players carry the service's lifetime countdown
        // average, which beats anything the local window can compute.
        // Other families have no server-side counterpart.
        let server_stat = match family {
            StatFamily::X01 => player
                .user
                .as_ref()
                .map(|user| user.average.unwrap_or(stats.match_stats.average)),
            _ => None,
        };

        entries.push(LegEntry {
            name: player.name.clone(),
            server_stat,
            counters,
        });
    }
    entries
}

/// Total marks player `i` scored this leg, summed over every segment.
fn marks_for(snap: &MatchSnapshot, i: usize) -> i64 {
    snap.state
        .segments
        .values()
        .filter_map(|hits| hits.get(i))
        .sum()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::{
        dao::stats_store::StatsStore,
        engine::testutil,
    };

    async fn memory_store() -> Arc<StatsStore> {
        let store = StatsStore::connect("sqlite::memory:").await.unwrap();
        store.ensure_schema().await.unwrap();
        Arc::new(store)
    }

    fn x01_snapshot() -> MatchSnapshot {
        let mut snap = testutil::snapshot("X01", &["Ann", "Bob"]);
        snap.leg = 1;
        snap.stats = serde_json::from_value(json!([
            {"legStats": {"average": 60.0, "score": 180, "dartsThrown": 9},
             "matchStats": {"average": 55.0}},
            {"legStats": {"average": 40.0, "score": 120, "dartsThrown": 9},
             "matchStats": {"average": 41.0}}
        ]))
        .unwrap();
        snap
    }

    #[tokio::test]
    async fn finished_leg_is_recorded_once() {
        let store = memory_store().await;
        let mut engine = testutil::engine_for(&["Ann", "Bob"]);
        let snap = x01_snapshot();

        record_finished_leg(&mut engine, Some(store.clone()), &snap).await;
        assert!(engine.leg_already_recorded("match-1-1"));

        // Replaying the same leg adds no second history row.
        record_finished_leg(&mut engine, Some(store.clone()), &snap).await;
        let stored = store
            .overall_stat(StatFamily::X01, "ann")
            .await
            .unwrap()
            .unwrap();
        assert!((stored - 60.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn aggregates_flow_back_into_the_player_cache() {
        let store = memory_store().await;
        let mut engine = testutil::engine_for(&["Ann", "Bob"]);
        record_finished_leg(&mut engine, Some(store), &x01_snapshot()).await;

        let cached = engine.players.get("ann").unwrap();
        assert!((cached.average - 60.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn placeholder_players_are_skipped() {
        let store = memory_store().await;
        let mut engine = testutil::engine_for(&["Test Player", "Bob"]);
        let mut snap = x01_snapshot();
        snap.players[0].name = "Test Player".into();

        record_finished_leg(&mut engine, Some(store.clone()), &snap).await;
        assert_eq!(
            store.overall_stat(StatFamily::X01, "test player").await.unwrap(),
            None
        );
        assert!(store
            .overall_stat(StatFamily::X01, "bob")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn variants_without_a_family_record_nothing() {
        let store = memory_store().await;
        let mut engine = testutil::engine_for(&["Ann"]);
        let snap = testutil::snapshot("Bermuda", &["Ann"]);

        record_finished_leg(&mut engine, Some(store), &snap).await;
        assert!(!engine.leg_already_recorded("match-1-1"));
    }

    #[test]
    fn marks_sum_over_segments() {
        let mut snap = testutil::snapshot("Cricket", &["Ann", "Bob"]);
        snap.state.segments =
            serde_json::from_value(json!({"20": [3, 1], "19": [2, 0], "25": [1, 4]})).unwrap();
        assert_eq!(marks_for(&snap, 0), 6);
        assert_eq!(marks_for(&snap, 1), 5);
    }
}
