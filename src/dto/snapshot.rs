//! Upstream match snapshot shapes.
//!
//! The scoring service pushes full match state on every change. Only the
//! fields the engine consumes are modelled; everything else is ignored on
//! deserialization. Missing sentinel fields default to the values the
//! service itself uses (`-1` winner indices, round counters starting at 1).

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

/// Full match state as pushed by the scoring service.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchSnapshot {
    /// Match identifier.
    pub id: String,
    /// Variant label, drives processor dispatch.
    pub variant: String,
    /// Variant settings chosen at match creation.
    pub settings: MatchSettings,
    /// Players in seating order for the current leg.
    pub players: Vec<MatchPlayer>,
    /// Turn records, newest first.
    pub turns: Vec<TurnRecord>,
    /// 1-based round counter.
    pub round: i64,
    /// 1-based leg counter.
    pub leg: i64,
    /// 1-based set counter.
    pub set: i64,
    /// Legs required to win a set.
    pub legs: i64,
    /// Sets required to win the match.
    pub sets: i64,
    /// Current scores indexed like `players`.
    pub game_scores: Option<Vec<i64>>,
    /// Accumulated leg/set wins indexed like `players`.
    pub scores: Option<Vec<ScoreRecord>>,
    /// Per-player running statistics indexed like `players`.
    pub stats: Vec<PlayerStatsRecord>,
    /// Index of the player at the oche.
    pub player: usize,
    /// Match winner index, `-1` while undecided.
    pub winner: i64,
    /// Leg winner index, `-1` while undecided.
    pub game_winner: i64,
    /// Whether the current leg has finished.
    pub game_finished: bool,
    /// Variant-specific live state.
    pub state: SnapshotState,
    /// Creation timestamp (RFC 3339), present on REST listings.
    pub created_at: Option<String>,
    /// Whether the match has concluded, present on REST listings.
    pub finished: Option<bool>,
}

impl Default for MatchSnapshot {
    fn default() -> Self {
        Self {
            id: String::new(),
            variant: String::new(),
            settings: MatchSettings::default(),
            players: Vec::new(),
            turns: Vec::new(),
            round: 1,
            leg: 1,
            set: 1,
            legs: 0,
            sets: 0,
            game_scores: None,
            scores: None,
            stats: Vec::new(),
            player: 0,
            winner: -1,
            game_winner: -1,
            game_finished: false,
            state: SnapshotState::default(),
            created_at: None,
            finished: None,
        }
    }
}

impl MatchSnapshot {
    /// Score of player `i`, zero when the service has not published scores yet.
    pub fn score_for(&self, i: usize) -> i64 {
        self.game_scores
            .as_ref()
            .and_then(|scores| scores.get(i).copied())
            .unwrap_or(0)
    }

    /// Legs won by player `i`.
    pub fn legs_for(&self, i: usize) -> i64 {
        self.scores
            .as_ref()
            .and_then(|scores| scores.get(i))
            .map(|record| record.legs)
            .unwrap_or(0)
    }

    /// Sets won by player `i`.
    pub fn sets_for(&self, i: usize) -> i64 {
        self.scores
            .as_ref()
            .and_then(|scores| scores.get(i))
            .map(|record| record.sets)
            .unwrap_or(0)
    }

    /// Statistics block of player `i`, zeroed when absent.
    pub fn stats_for(&self, i: usize) -> PlayerStatsRecord {
        self.stats.get(i).cloned().unwrap_or_default()
    }

    /// The in-progress turn, when one exists.
    pub fn first_turn(&self) -> Option<&TurnRecord> {
        self.turns.first()
    }
}

/// Variant settings chosen when the match was created.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchSettings {
    /// Display label overriding the variant name, when present.
    pub game_mode: Option<String>,
    /// Starting score for countdown variants.
    pub base_score: i64,
    /// Round cap for capped variants.
    pub max_rounds: i64,
    /// Entry rule label.
    pub in_mode: Option<String>,
    /// Exit rule label.
    pub out_mode: Option<String>,
    /// Target traversal order label.
    pub order: Option<String>,
    /// Scoring flavour for variants that have one.
    pub mode: Option<String>,
    /// Scoring flavour for mark-based variants.
    pub scoring_mode: Option<String>,
    /// Hits required per target, or session hit budget.
    pub hits: Option<i64>,
    /// Session dart budget for practice variants.
    pub throws: Option<i64>,
    /// Score to reach in race variants.
    pub target_score: i64,
}

/// One player entry in the snapshot roster.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchPlayer {
    /// Display name.
    pub name: String,
    /// Stable index assigned at match creation, survives leg rotation.
    pub index: Option<i64>,
    /// Account id, present for signed-in players.
    pub user_id: Option<String>,
    /// Account id of the match host.
    pub host_id: Option<String>,
    /// Board the player throws on.
    pub board_id: Option<String>,
    /// Embedded account record for signed-in players.
    pub user: Option<UserRef>,
}

/// Embedded account record.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserRef {
    /// Account id.
    pub id: Option<String>,
    /// Account display name.
    pub name: Option<String>,
    /// Server-side lifetime three-dart average.
    pub average: Option<f64>,
}

/// Accumulated leg/set wins for one player.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScoreRecord {
    /// Legs won in the current set.
    pub legs: i64,
    /// Sets won in the match.
    pub sets: i64,
}

/// One turn record; the service lists the in-progress turn first.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TurnRecord {
    /// Turn identifier, ignored for frame deduplication.
    pub id: Option<Value>,
    /// Turn creation timestamp, ignored for frame deduplication.
    pub created_at: Option<String>,
    /// Raw throw records.
    pub throws: Vec<Value>,
    /// Whether the turn busted.
    pub busted: bool,
}

/// Running statistics for one player.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlayerStatsRecord {
    /// Statistics over the current leg.
    pub leg_stats: StatBlock,
    /// Statistics over the whole match.
    pub match_stats: StatBlock,
}

/// One statistics window.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatBlock {
    /// Three-dart average.
    pub average: f64,
    /// Marks per round.
    pub mpr: f64,
    /// Hit rate.
    pub hit_rate: f64,
    /// Points scored.
    pub score: i64,
    /// Darts thrown.
    pub darts_thrown: i64,
    /// Dart board coordinates of the bull-off throw, set once thrown.
    pub coords: Option<Value>,
}

/// Variant-specific live state.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SnapshotState {
    /// Suggested checkout path.
    pub checkout_guide: Vec<Value>,
    /// Per-segment hit counts for mark-based variants, indexed like `players`.
    pub segments: IndexMap<String, Vec<i64>>,
    /// Round target schedule; shape differs per variant.
    pub targets: Value,
    /// Per-player progress indices into `targets` for traversal variants.
    pub current_targets: Vec<i64>,
    /// Current segment for segment practice.
    pub target: Option<SegmentTarget>,
}

/// Segment practice target.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SegmentTarget {
    /// Segment number, `25` for bull.
    pub number: Option<i64>,
    /// Bed within the segment.
    pub bed: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sentinel_defaults_apply_when_fields_are_absent() {
        let snapshot: MatchSnapshot = serde_json::from_value(json!({
            "id": "m-1",
            "variant": "X01",
        }))
        .unwrap();
        assert_eq!(snapshot.winner, -1);
        assert_eq!(snapshot.game_winner, -1);
        assert_eq!(snapshot.round, 1);
        assert_eq!(snapshot.score_for(0), 0);
    }

    #[test]
    fn roster_and_scores_deserialize() {
        let snapshot: MatchSnapshot = serde_json::from_value(json!({
            "id": "m-2",
            "variant": "Cricket",
            "players": [
                {"name": "Ann", "index": 0, "userId": "u1", "hostId": "u1",
                 "boardId": "b1", "user": {"id": "u1", "average": 48.5}},
                {"name": "Bob", "index": 1}
            ],
            "gameScores": [120, 80],
            "scores": [{"legs": 1, "sets": 0}, {"legs": 0, "sets": 0}],
            "state": {"segments": {"20": [3, 1], "25": [0, 2]}},
            "turns": [{"id": "t1", "createdAt": "2026-01-01T00:00:00Z",
                       "throws": [{"segment": {"number": 20}}], "busted": false}]
        }))
        .unwrap();
        assert_eq!(snapshot.score_for(1), 80);
        assert_eq!(snapshot.legs_for(0), 1);
        assert_eq!(snapshot.players[0].user.as_ref().unwrap().average, Some(48.5));
        assert_eq!(snapshot.state.segments["25"], vec![0, 2]);
        assert_eq!(snapshot.first_turn().unwrap().throws.len(), 1);
    }
}
