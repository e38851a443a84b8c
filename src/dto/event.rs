//! Canonical display event model.
//!
//! Every inbound match frame, whatever the variant, is normalized into a
//! [`GameEvent`] before it reaches display clients. Clients never see raw
//! upstream payloads.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Fixed vocabulary of game states understood by display clients.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    /// A throw is expected from the current player.
    #[default]
    Throw,
    /// The current leg has been decided.
    LegWon,
    /// The whole match has been decided.
    MatchWon,
    /// The current turn exceeded the remaining score.
    Busted,
    /// The variant's round limit has been reached.
    GameOver,
    /// A bull-off round ended without a unique closest dart.
    BullOffTie,
}

/// Who a player is to the local board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlayerKind {
    /// Walk-up player with no account.
    #[default]
    Guest,
    /// Player with a scoring-service account.
    Registered,
    /// The account hosting the match on this board.
    Owner,
}

/// Which side won and at what granularity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum WinKind {
    /// The match is over.
    #[serde(rename = "Match")]
    Match,
    /// A single leg is over.
    #[serde(rename = "Leg")]
    Leg,
    /// The opening bull-off round is over.
    #[serde(rename = "Bull-off")]
    BullOff,
}

/// Winner annotation attached to decided frames.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WinnerInfo {
    /// Display name of the winning player.
    pub player: String,
    /// Granularity of the win.
    #[serde(rename = "type")]
    pub kind: WinKind,
}

/// Rule block describing the running match, normalized across variants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MatchRules {
    /// Variant label shown to clients.
    pub game_mode: String,
    /// Whether leg statistics are being persisted.
    pub use_db: bool,
    /// Legs needed to take a set, `0` when untracked.
    pub legs_to_win: i64,
    /// Sets needed to take the match, `0` when untracked.
    pub sets_to_win: i64,
    /// Round cap for capped variants, `0` when uncapped.
    pub max_rounds: i64,
    /// Starting score for countdown variants.
    pub start_score: i64,
    /// Entry rule label (e.g. `Straight`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_mode: Option<String>,
    /// Exit rule label (e.g. `Double`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_mode: Option<String>,
    /// Variant-specific scoring flavour (e.g. `Cut Throat`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scoring_mode: Option<String>,
    /// Closable segment labels for mark-based variants.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub targets: Vec<String>,
    /// Target traversal order label (e.g. `1-20-Bull`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    /// Hits required per target in traversal variants.
    pub hits_per_target: i64,
    /// What ends a practice session: `hits` or `darts`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_after_type: Option<String>,
    /// Threshold paired with `ends_after_type`.
    pub ends_after_value: i64,
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            game_mode: String::new(),
            use_db: true,
            legs_to_win: 0,
            sets_to_win: 0,
            max_rounds: 0,
            start_score: 0,
            in_mode: None,
            out_mode: None,
            scoring_mode: None,
            targets: Vec::new(),
            order: None,
            hits_per_target: 0,
            ends_after_type: None,
            ends_after_value: 0,
        }
    }
}

impl MatchRules {
    /// Fresh rule block for a variant override, preserving the persistence flag.
    pub fn for_mode(game_mode: impl Into<String>, use_db: bool) -> Self {
        Self {
            game_mode: game_mode.into(),
            use_db,
            ..Self::default()
        }
    }
}

/// Round target as displayed to clients.
///
/// Most variants use a plain label; segment practice carries a structured
/// segment/bed pair instead.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum RoundTarget {
    /// Human-readable label such as `D16`, `Bull`, or `Triple`.
    Label(String),
    /// Structured target for segment practice.
    Segment {
        /// Segment number, `25` for bull.
        segment: Option<i64>,
        /// Bed within the segment (`Single`, `Double`, `Triple`).
        mode: Option<String>,
    },
}

impl RoundTarget {
    /// Plain-label constructor.
    pub fn label(value: impl Into<String>) -> Self {
        Self::Label(value.into())
    }
}

/// Live turn information.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema, Default)]
pub struct TurnState {
    /// 1-based round counter.
    pub current_round: i64,
    /// 1-based leg counter.
    pub current_leg: i64,
    /// 1-based set counter.
    pub current_set: i64,
    /// Target for this round, when the variant defines one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<RoundTarget>,
    /// Raw throw records for the turn, passed through verbatim.
    #[schema(value_type = Vec<Object>)]
    pub throws: Vec<Value>,
    /// Whether the turn busted.
    pub busted: bool,
}

/// Score cell: numeric for scoring variants, a placeholder during bull-off.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ScoreValue {
    /// Regular numeric score.
    Points(i64),
    /// Non-numeric placeholder (bull-off shows `-`).
    Text(String),
}

impl Default for ScoreValue {
    fn default() -> Self {
        Self::Points(0)
    }
}

impl From<i64> for ScoreValue {
    fn from(value: i64) -> Self {
        Self::Points(value)
    }
}

impl ScoreValue {
    /// Numeric value, treating placeholders as unbeatable for comparisons.
    pub fn points(&self) -> i64 {
        match self {
            Self::Points(value) => *value,
            Self::Text(_) => i64::MAX,
        }
    }
}

/// One player's scoreboard row inside a [`GameEvent`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema, Default)]
pub struct PlayerState {
    /// Display name as reported upstream.
    pub name: String,
    /// Relation of the player to the local board.
    pub player_type: PlayerKind,
    /// Seat order latched from the first frame the player appeared in.
    pub display_order: Option<usize>,
    /// Current score.
    pub score: ScoreValue,
    /// Legs won so far.
    pub legs_won: i64,
    /// Sets won so far.
    pub sets_won: i64,
    /// Three-dart average for the running leg.
    pub leg_average: f64,
    /// Three-dart average for the running match.
    pub match_average: f64,
    /// Lifetime three-dart average from the statistics store.
    pub overall_average: f64,
    /// Marks per round for the running leg.
    pub mpr: f64,
    /// Lifetime marks per round from the statistics store.
    pub overall_mpr: f64,
    /// Per-target hit counts for mark-based variants.
    #[serde(skip_serializing_if = "IndexMap::is_empty", default)]
    #[schema(value_type = Object)]
    pub hits: IndexMap<String, i64>,
    /// Personal target in traversal variants.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_target: Option<String>,
    /// Lifetime hit rate from the statistics store.
    pub overall_hit_rate: f64,
    /// Hit rate for the running match.
    pub match_hit_rate: f64,
    /// Hit rate for the running leg.
    pub leg_hit_rate: f64,
    /// Darts thrown in the running leg.
    pub darts_thrown_leg: i64,
    /// Lifetime points per round from the statistics store.
    pub overall_ppr: f64,
}

/// Canonical scoreboard frame broadcast to display clients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GameEvent {
    /// Event kind, always `game-update` for scoreboard frames.
    pub event: String,
    /// Display state driving client rendering.
    pub game_state: GameState,
    /// Normalized rule block.
    #[serde(rename = "match")]
    pub rules: MatchRules,
    /// Live turn information.
    pub turn: TurnState,
    /// Scoreboard rows, one per player in upstream order.
    pub players: Vec<PlayerState>,
    /// Index of the player currently at the oche.
    pub current_player_index: usize,
    /// Winner annotation, present on decided frames.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner_info: Option<WinnerInfo>,
    /// Suggested checkout path, passed through verbatim.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    #[schema(value_type = Vec<Object>)]
    pub checkout_guide: Vec<Value>,
}

/// Event kind used for every scoreboard frame.
pub const EVT_GAME_UPDATE: &str = "game-update";
/// Event kind announcing a new match.
pub const EVT_MATCH_STARTED: &str = "match-started";
/// Event kind announcing the end of a match.
pub const EVT_MATCH_ENDED: &str = "match-ended";
/// Event kind carrying board controller status changes.
pub const EVT_BOARD: &str = "board";
/// Event kind carrying lobby roster notices.
pub const EVT_LOBBY: &str = "lobby";

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_event() -> GameEvent {
        GameEvent {
            event: EVT_GAME_UPDATE.into(),
            game_state: GameState::Throw,
            rules: MatchRules {
                game_mode: "X01".into(),
                start_score: 501,
                legs_to_win: 3,
                out_mode: Some("Double".into()),
                ..MatchRules::default()
            },
            turn: TurnState {
                current_round: 2,
                current_leg: 1,
                current_set: 1,
                target: None,
                throws: vec![json!({"segment": {"number": 20, "bed": "Triple"}})],
                busted: false,
            },
            players: vec![PlayerState {
                name: "Ann".into(),
                player_type: PlayerKind::Registered,
                display_order: Some(0),
                score: ScoreValue::Points(441),
                leg_average: 60.0,
                overall_average: 54.3,
                ..PlayerState::default()
            }],
            current_player_index: 0,
            winner_info: None,
            checkout_guide: Vec::new(),
        }
    }

    #[test]
    fn rules_serialize_under_match_key() {
        let value = serde_json::to_value(sample_event()).unwrap();
        assert_eq!(value["match"]["game_mode"], "X01");
        assert!(value.get("rules").is_none());
        assert!(value.get("winner_info").is_none());
    }

    #[test]
    fn event_round_trips() {
        let event = sample_event();
        let text = serde_json::to_string(&event).unwrap();
        let back: GameEvent = serde_json::from_str(&text).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn win_kind_uses_display_labels() {
        let info = WinnerInfo {
            player: "ann".into(),
            kind: WinKind::BullOff,
        };
        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["type"], "Bull-off");
    }

    #[test]
    fn bull_off_placeholder_score_survives() {
        let value = serde_json::to_value(ScoreValue::Text("-".into())).unwrap();
        assert_eq!(value, json!("-"));
        let back: ScoreValue = serde_json::from_value(json!(57)).unwrap();
        assert_eq!(back, ScoreValue::Points(57));
    }
}
