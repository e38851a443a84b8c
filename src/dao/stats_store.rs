//! SQLite-backed lifetime statistics store.
//!
//! Each variant family keeps its own player table and per-leg history
//! table. Lifetime aggregates are recomputed over a rolling window of the
//! most recent legs and cached in the player table, so reads at match
//! start are a single column lookup.

use std::str::FromStr;

use sqlx::{
    Row, SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tracing::debug;

use crate::dao::storage::{StorageError, StorageResult};

/// Number of most recent legs contributing to a lifetime aggregate.
const AGGREGATE_WINDOW: i64 = 100;

/// Statistic family a variant maps to.
///
/// Families share a schema shape but differ in which per-leg counters are
/// recorded and how the lifetime aggregate is derived from them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatFamily {
    /// Countdown play, aggregated as a three-dart average.
    X01,
    /// Cricket, aggregated as marks per round.
    Cricket,
    /// Tactics, aggregated as marks per round.
    Tactics,
    /// Around the Clock, aggregated as a hit rate.
    Atc,
    /// Count Up, aggregated as points per round.
    CountUp,
    /// Segment practice, aggregated as a hit rate.
    SegmentTraining,
}

impl StatFamily {
    /// Every family, used when creating the schema.
    pub const ALL: [StatFamily; 6] = [
        StatFamily::X01,
        StatFamily::Cricket,
        StatFamily::Tactics,
        StatFamily::Atc,
        StatFamily::CountUp,
        StatFamily::SegmentTraining,
    ];

    fn suffix(self) -> &'static str {
        match self {
            StatFamily::X01 => "x01",
            StatFamily::Cricket => "cricket",
            StatFamily::Tactics => "tactics",
            StatFamily::Atc => "atc",
            StatFamily::CountUp => "countup",
            StatFamily::SegmentTraining => "segment_training",
        }
    }

    /// Player table holding the cached lifetime aggregate.
    pub fn player_table(self) -> String {
        format!("players_{}", self.suffix())
    }

    /// History table holding one row per finished leg.
    pub fn history_table(self) -> String {
        format!("games_history_{}", self.suffix())
    }

    /// Column in the player table carrying the lifetime aggregate.
    pub fn aggregate_column(self) -> &'static str {
        match self {
            StatFamily::X01 => "average",
            StatFamily::Cricket | StatFamily::Tactics => "mpr",
            StatFamily::Atc | StatFamily::SegmentTraining => "hit_rate",
            StatFamily::CountUp => "ppr",
        }
    }

    /// Per-leg counter columns with their SQLite types.
    fn history_columns(self) -> &'static [(&'static str, &'static str)] {
        match self {
            StatFamily::X01 => &[
                ("leg_average", "REAL"),
                ("leg_points", "INTEGER"),
                ("leg_darts", "INTEGER"),
            ],
            StatFamily::Cricket | StatFamily::Tactics => {
                &[("leg_marks", "INTEGER"), ("leg_darts", "INTEGER")]
            }
            StatFamily::Atc | StatFamily::SegmentTraining => {
                &[("leg_hit_rate", "REAL"), ("leg_darts", "INTEGER")]
            }
            StatFamily::CountUp => &[("leg_points", "INTEGER"), ("leg_darts", "INTEGER")],
        }
    }
}

/// Counters recorded for one player over one finished leg.
#[derive(Clone, Debug, PartialEq)]
pub enum LegCounters {
    /// Countdown counters.
    X01 {
        /// Three-dart average over the leg.
        average: f64,
        /// Points scored over the leg.
        points: i64,
        /// Darts thrown over the leg.
        darts: i64,
    },
    /// Mark-based counters.
    Marks {
        /// Marks scored over the leg.
        marks: i64,
        /// Darts thrown over the leg.
        darts: i64,
    },
    /// Hit-rate counters.
    HitRate {
        /// Hit rate over the leg.
        rate: f64,
        /// Darts thrown over the leg.
        darts: i64,
    },
    /// Plain points counters.
    Points {
        /// Points scored over the leg.
        points: i64,
        /// Darts thrown over the leg.
        darts: i64,
    },
}

impl LegCounters {
    /// Darts thrown; legs without a single dart record no history row.
    pub fn darts(&self) -> i64 {
        match self {
            LegCounters::X01 { darts, .. }
            | LegCounters::Marks { darts, .. }
            | LegCounters::HitRate { darts, .. }
            | LegCounters::Points { darts, .. } => *darts,
        }
    }
}

/// One player's contribution to a finished leg.
#[derive(Clone, Debug)]
pub struct LegEntry {
    /// Display name; stored lowercased.
    pub name: String,
    /// Authoritative lifetime value for signed-in players, bypassing the
    /// local rolling window.
    pub server_stat: Option<f64>,
    /// Per-leg counters.
    pub counters: LegCounters,
}

/// Refreshed lifetime aggregate for one player.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerAggregate {
    /// Lowercased player name.
    pub name: String,
    /// New lifetime aggregate value.
    pub value: f64,
}

/// Handle over the SQLite pool.
#[derive(Clone, Debug)]
pub struct StatsStore {
    pool: SqlitePool,
}

impl StatsStore {
    /// Open (and create if missing) the database at `url`.
    ///
    /// A single connection is enough: all writes happen in one
    /// leg-recording transaction at a time.
    pub async fn connect(url: &str) -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|err| StorageError::query("invalid database url", err))?
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|err| StorageError::unavailable(format!("connecting to {url}"), err))?;
        Ok(Self { pool })
    }

    /// Create every family's tables and indexes when they do not exist yet.
    pub async fn ensure_schema(&self) -> StorageResult<()> {
        for family in StatFamily::ALL {
            let players = family.player_table();
            let history = family.history_table();
            let aggregate = family.aggregate_column();

            let create_players = format!(
                "CREATE TABLE IF NOT EXISTS {players} (\
                 id INTEGER PRIMARY KEY AUTOINCREMENT, \
                 name TEXT NOT NULL UNIQUE, \
                 is_registered INTEGER NOT NULL DEFAULT 0, \
                 {aggregate} REAL NOT NULL DEFAULT 0)"
            );

            let counters = family
                .history_columns()
                .iter()
                .map(|(name, kind)| format!("{name} {kind} NOT NULL DEFAULT 0"))
                .collect::<Vec<_>>()
                .join(", ");
            let create_history = format!(
                "CREATE TABLE IF NOT EXISTS {history} (\
                 id INTEGER PRIMARY KEY AUTOINCREMENT, \
                 player_id INTEGER NOT NULL REFERENCES {players}(id), \
                 match_id TEXT NOT NULL, \
                 leg_number INTEGER NOT NULL, \
                 finished_at TEXT NOT NULL DEFAULT (datetime('now')), \
                 {counters})"
            );
            let create_index = format!(
                "CREATE INDEX IF NOT EXISTS idx_{history}_player \
                 ON {history} (player_id, finished_at)"
            );

            for statement in [&create_players, &create_history, &create_index] {
                sqlx::query(statement)
                    .execute(&self.pool)
                    .await
                    .map_err(|err| StorageError::query("creating statistics schema", err))?;
            }
        }
        debug!("statistics schema ready");
        Ok(())
    }

    /// Cheap liveness probe used by the store supervisor.
    pub async fn ping(&self) -> StorageResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|err| StorageError::unavailable("ping failed".into(), err))?;
        Ok(())
    }

    /// Cached lifetime aggregate for a player, `None` when unknown.
    pub async fn overall_stat(&self, family: StatFamily, name: &str) -> StorageResult<Option<f64>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE name = ?1",
            family.aggregate_column(),
            family.player_table()
        );
        let row = sqlx::query(&sql)
            .bind(name.to_lowercase())
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| StorageError::query("reading lifetime aggregate", err))?;
        Ok(row.map(|row| row.get::<f64, _>(0)))
    }

    /// Record a finished leg for every listed player and refresh their
    /// lifetime aggregates, all in one transaction.
    ///
    /// Legs without a thrown dart contribute no history row but still
    /// refresh the aggregate. Players with an authoritative server value
    /// take it verbatim and are flagged as registered.
    pub async fn record_leg(
        &self,
        family: StatFamily,
        match_id: &str,
        leg: i64,
        entries: &[LegEntry],
    ) -> StorageResult<Vec<PlayerAggregate>> {
        let players = family.player_table();
        let history = family.history_table();
        let aggregate = family.aggregate_column();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|err| StorageError::query("opening leg transaction", err))?;

        let mut refreshed = Vec::with_capacity(entries.len());
        for entry in entries {
            let key = entry.name.to_lowercase();
            let player_id = {
                let row = sqlx::query(&format!("SELECT id FROM {players} WHERE name = ?1"))
                    .bind(&key)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(|err| StorageError::query("looking up player", err))?;
                match row {
                    Some(row) => row.get::<i64, _>(0),
                    None => sqlx::query(&format!("INSERT INTO {players} (name) VALUES (?1)"))
                        .bind(&key)
                        .execute(&mut *tx)
                        .await
                        .map_err(|err| StorageError::query("creating player", err))?
                        .last_insert_rowid(),
                }
            };

            if entry.counters.darts() > 0 {
                insert_history(&mut tx, &history, player_id, match_id, leg, &entry.counters)
                    .await?;
            }

            let value = match entry.server_stat {
                Some(stat) => {
                    sqlx::query(&format!(
                        "UPDATE {players} SET {aggregate} = ?1, is_registered = 1 WHERE id = ?2"
                    ))
                    .bind(stat)
                    .bind(player_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(|err| StorageError::query("storing server aggregate", err))?;
                    stat
                }
                None => {
                    let value = recompute_aggregate(&mut tx, family, &history, player_id).await?;
                    sqlx::query(&format!(
                        "UPDATE {players} SET {aggregate} = ?1 WHERE id = ?2"
                    ))
                    .bind(value)
                    .bind(player_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(|err| StorageError::query("storing recomputed aggregate", err))?;
                    value
                }
            };

            refreshed.push(PlayerAggregate { name: key, value });
        }

        tx.commit()
            .await
            .map_err(|err| StorageError::query("committing leg transaction", err))?;
        Ok(refreshed)
    }
}

/// Insert one history row matching the family's counter columns.
async fn insert_history(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    history: &str,
    player_id: i64,
    match_id: &str,
    leg: i64,
    counters: &LegCounters,
) -> StorageResult<()> {
    let result = match counters {
        LegCounters::X01 {
            average,
            points,
            darts,
        } => {
            sqlx::query(&format!(
                "INSERT INTO {history} \
                 (player_id, match_id, leg_number, leg_average, leg_points, leg_darts) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
            ))
            .bind(player_id)
            .bind(match_id)
            .bind(leg)
            .bind(average)
            .bind(points)
            .bind(darts)
            .execute(&mut **tx)
            .await
        }
        LegCounters::Marks { marks, darts } => {
            sqlx::query(&format!(
                "INSERT INTO {history} (player_id, match_id, leg_number, leg_marks, leg_darts) \
                 VALUES (?1, ?2, ?3, ?4, ?5)"
            ))
            .bind(player_id)
            .bind(match_id)
            .bind(leg)
            .bind(marks)
            .bind(darts)
            .execute(&mut **tx)
            .await
        }
        LegCounters::HitRate { rate, darts } => {
            sqlx::query(&format!(
                "INSERT INTO {history} (player_id, match_id, leg_number, leg_hit_rate, leg_darts) \
                 VALUES (?1, ?2, ?3, ?4, ?5)"
            ))
            .bind(player_id)
            .bind(match_id)
            .bind(leg)
            .bind(rate)
            .bind(darts)
            .execute(&mut **tx)
            .await
        }
        LegCounters::Points { points, darts } => {
            sqlx::query(&format!(
                "INSERT INTO {history} (player_id, match_id, leg_number, leg_points, leg_darts) \
                 VALUES (?1, ?2, ?3, ?4, ?5)"
            ))
            .bind(player_id)
            .bind(match_id)
            .bind(leg)
            .bind(points)
            .bind(darts)
            .execute(&mut **tx)
            .await
        }
    };
    result.map_err(|err| StorageError::query("recording leg history", err))?;
    Ok(())
}

/// Recompute a lifetime aggregate over the most recent legs.
async fn recompute_aggregate(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    family: StatFamily,
    history: &str,
    player_id: i64,
) -> StorageResult<f64> {
    let value = match family {
        StatFamily::X01 | StatFamily::CountUp => {
            let row = sqlx::query(&format!(
                "SELECT COALESCE(SUM(leg_points), 0) AS points, \
                        COALESCE(SUM(leg_darts), 0) AS darts \
                 FROM (SELECT leg_points, leg_darts FROM {history} \
                       WHERE player_id = ?1 \
                       ORDER BY finished_at DESC, id DESC LIMIT {AGGREGATE_WINDOW})"
            ))
            .bind(player_id)
            .fetch_one(&mut **tx)
            .await
            .map_err(|err| StorageError::query("aggregating points window", err))?;
            let points: i64 = row.get("points");
            let darts: i64 = row.get("darts");
            if darts > 0 {
                points as f64 / darts as f64 * 3.0
            } else {
                0.0
            }
        }
        StatFamily::Cricket | StatFamily::Tactics => {
            let row = sqlx::query(&format!(
                "SELECT COALESCE(SUM(leg_marks), 0) AS marks, \
                        COALESCE(SUM(leg_darts), 0) AS darts \
                 FROM (SELECT leg_marks, leg_darts FROM {history} \
                       WHERE player_id = ?1 \
                       ORDER BY finished_at DESC, id DESC LIMIT {AGGREGATE_WINDOW})"
            ))
            .bind(player_id)
            .fetch_one(&mut **tx)
            .await
            .map_err(|err| StorageError::query("aggregating marks window", err))?;
            let marks: i64 = row.get("marks");
            let darts: i64 = row.get("darts");
            if darts > 0 {
                (marks * 3) as f64 / darts as f64
            } else {
                0.0
            }
        }
        StatFamily::Atc | StatFamily::SegmentTraining => {
            let row = sqlx::query(&format!(
                "SELECT COALESCE(AVG(leg_hit_rate), 0.0) AS rate \
                 FROM (SELECT leg_hit_rate FROM {history} \
                       WHERE player_id = ?1 \
                       ORDER BY finished_at DESC, id DESC LIMIT {AGGREGATE_WINDOW})"
            ))
            .bind(player_id)
            .fetch_one(&mut **tx)
            .await
            .map_err(|err| StorageError::query("aggregating hit-rate window", err))?;
            row.get::<f64, _>("rate")
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> StatsStore {
        let store = StatsStore::connect("sqlite::memory:").await.unwrap();
        store.ensure_schema().await.unwrap();
        store
    }

    fn x01_entry(name: &str, average: f64, points: i64, darts: i64) -> LegEntry {
        LegEntry {
            name: name.into(),
            server_stat: None,
            counters: LegCounters::X01 {
                average,
                points,
                darts,
            },
        }
    }

    #[tokio::test]
    async fn guest_average_is_recomputed_from_history() {
        let store = memory_store().await;
        let refreshed = store
            .record_leg(StatFamily::X01, "m-1", 1, &[x01_entry("Ann", 60.0, 180, 9)])
            .await
            .unwrap();
        assert_eq!(refreshed.len(), 1);
        assert_eq!(refreshed[0].name, "ann");
        assert!((refreshed[0].value - 60.0).abs() < f64::EPSILON);

        let stored = store.overall_stat(StatFamily::X01, "ANN").await.unwrap();
        assert_eq!(stored, Some(refreshed[0].value));
    }

    #[tokio::test]
    async fn registered_player_takes_server_value() {
        let store = memory_store().await;
        let entry = LegEntry {
            server_stat: Some(48.5),
            ..x01_entry("Bob", 90.0, 501, 15)
        };
        let refreshed = store
            .record_leg(StatFamily::X01, "m-2", 1, &[entry])
            .await
            .unwrap();
        assert!((refreshed[0].value - 48.5).abs() < f64::EPSILON);
        assert_eq!(
            store.overall_stat(StatFamily::X01, "bob").await.unwrap(),
            Some(48.5)
        );
    }

    #[tokio::test]
    async fn dartless_leg_records_no_history_but_still_refreshes() {
        let store = memory_store().await;
        let refreshed = store
            .record_leg(StatFamily::X01, "m-3", 1, &[x01_entry("Cay", 0.0, 0, 0)])
            .await
            .unwrap();
        assert_eq!(refreshed[0].value, 0.0);

        // A later real leg is the only one contributing to the window.
        let refreshed = store
            .record_leg(StatFamily::X01, "m-3", 2, &[x01_entry("Cay", 45.0, 135, 9)])
            .await
            .unwrap();
        assert!((refreshed[0].value - 45.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn marks_aggregate_is_marks_per_round() {
        let store = memory_store().await;
        let entry = LegEntry {
            name: "Dee".into(),
            server_stat: None,
            counters: LegCounters::Marks { marks: 12, darts: 9 },
        };
        let refreshed = store
            .record_leg(StatFamily::Cricket, "m-4", 1, &[entry])
            .await
            .unwrap();
        assert!((refreshed[0].value - 4.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn hit_rate_aggregate_averages_legs() {
        let store = memory_store().await;
        for (leg, rate) in [(1, 0.2), (2, 0.4)] {
            store
                .record_leg(
                    StatFamily::Atc,
                    "m-5",
                    leg,
                    &[LegEntry {
                        name: "Eve".into(),
                        server_stat: None,
                        counters: LegCounters::HitRate { rate, darts: 21 },
                    }],
                )
                .await
                .unwrap();
        }
        let stored = store
            .overall_stat(StatFamily::Atc, "eve")
            .await
            .unwrap()
            .unwrap();
        assert!((stored - 0.3).abs() < 1e-9);
    }

    #[tokio::test]
    async fn unknown_player_has_no_aggregate() {
        let store = memory_store().await;
        assert_eq!(
            store.overall_stat(StatFamily::CountUp, "nobody").await.unwrap(),
            None
        );
    }
}
