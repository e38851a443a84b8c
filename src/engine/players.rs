//! Per-match player identity cache.
//!
//! Upstream rotates the roster every leg so the thrower sits first. The
//! cache pins each player to the seat of the first frame they appeared
//! in (`display_order`) and to the stable index assigned at match
//! creation, so the scoreboard never reshuffles mid-match.

use std::collections::HashMap;

use crate::dao::stats_store::StatFamily;
use crate::dto::event::PlayerKind;

/// Cached identity and lifetime statistics for one player.
#[derive(Clone, Debug, Default)]
pub struct CachedPlayer {
    /// Relation of the player to the local board.
    pub kind: PlayerKind,
    /// Index assigned at match creation, survives per-leg rotation.
    pub stable_index: Option<i64>,
    /// Seat latched from the first frame the player appeared in.
    pub display_order: Option<usize>,
    /// Lifetime three-dart average.
    pub average: f64,
    /// Lifetime marks per round.
    pub mpr: f64,
    /// Lifetime hit rate.
    pub hit_rate: f64,
    /// Lifetime points per round.
    pub ppr: f64,
}

/// Identity cache keyed by lowercased player name, living for one match.
#[derive(Clone, Debug, Default)]
pub struct PlayerCache {
    entries: HashMap<String, CachedPlayer>,
}

impl PlayerCache {
    /// Whether any player is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Install an entry, replacing any previous one for the same name.
    pub fn insert(&mut self, name: &str, entry: CachedPlayer) {
        self.entries.insert(name.to_lowercase(), entry);
    }

    /// Look up a player by display name.
    pub fn get(&self, name: &str) -> Option<&CachedPlayer> {
        self.entries.get(&name.to_lowercase())
    }

    /// Latch the player's seat to `order` on first sight and return the
    /// latched value. Later frames never move a latched seat.
    pub fn latch_display_order(&mut self, name: &str, order: usize) -> usize {
        let entry = self.entries.entry(name.to_lowercase()).or_default();
        *entry.display_order.get_or_insert(order)
    }

    /// Forget every latched seat. Done when the bull-off concludes so the
    /// real match latches fresh seats.
    pub fn reset_display_orders(&mut self) {
        for entry in self.entries.values_mut() {
            entry.display_order = None;
        }
    }

    /// Resolve a stable index to the cached (lowercased) player name.
    pub fn name_for_stable_index(&self, index: i64) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, entry)| entry.stable_index == Some(index))
            .map(|(name, _)| name.as_str())
    }

    /// Refresh the cached lifetime value for the given statistics family.
    pub fn set_overall(&mut self, family: StatFamily, name: &str, value: f64) {
        let Some(entry) = self.entries.get_mut(&name.to_lowercase()) else {
            return;
        };
        match family {
            StatFamily::X01 => entry.average = value,
            StatFamily::Cricket | StatFamily::Tactics => entry.mpr = value,
            StatFamily::Atc | StatFamily::SegmentTraining => entry.hit_rate = value,
            StatFamily::CountUp => entry.ppr = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_order_latches_on_first_sight() {
        let mut cache = PlayerCache::default();
        assert_eq!(cache.latch_display_order("Ann", 0), 0);
        assert_eq!(cache.latch_display_order("Bob", 1), 1);

        // Next leg, roster rotated: latched seats must not move.
        assert_eq!(cache.latch_display_order("Bob", 0), 1);
        assert_eq!(cache.latch_display_order("Ann", 1), 0);
    }

    #[test]
    fn reset_allows_fresh_latching() {
        let mut cache = PlayerCache::default();
        cache.latch_display_order("Ann", 0);
        cache.reset_display_orders();
        assert_eq!(cache.latch_display_order("Ann", 1), 1);
    }

    #[test]
    fn stable_index_resolves_to_lowercased_name() {
        let mut cache = PlayerCache::default();
        cache.insert(
            "Ann",
            CachedPlayer {
                stable_index: Some(3),
                ..CachedPlayer::default()
            },
        );
        assert_eq!(cache.name_for_stable_index(3), Some("ann"));
        assert_eq!(cache.name_for_stable_index(7), None);
    }

    #[test]
    fn set_overall_targets_the_family_slot() {
        let mut cache = PlayerCache::default();
        cache.insert("Ann", CachedPlayer::default());
        cache.set_overall(StatFamily::Cricket, "ANN", 2.5);
        cache.set_overall(StatFamily::X01, "ann", 51.2);
        let entry = cache.get("Ann").unwrap();
        assert_eq!(entry.mpr, 2.5);
        assert_eq!(entry.average, 51.2);
        assert_eq!(entry.ppr, 0.0);
    }
}
