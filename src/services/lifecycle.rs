//! Match and lobby lifecycle.
//!
//! Entered when the board announces a match start (or one is resumed at
//! connect time): the match record is fetched once to seed the player
//! cache with identities and lifetime statistics, the live topics are
//! subscribed, and display clients are told a match began.

use serde_json::json;
use tracing::{info, warn};

use crate::{
    dao::stats_store::StatFamily,
    dto::{
        event::{EVT_MATCH_ENDED, EVT_MATCH_STARTED, PlayerKind},
        snapshot::MatchSnapshot,
        upstream::{CHANNEL_BOARDS, CHANNEL_MATCHES},
    },
    engine::{CachedPlayer, MatchEngine, Variant},
    error::ServiceError,
    services::broadcast,
    state::SharedState,
    upstream::{UpstreamLink, api},
};

/// Begin following a match: seed the player cache, subscribe to its
/// state topic, and announce it to display clients.
pub async fn start_match(
    state: &SharedState,
    engine: &mut MatchEngine,
    link: &UpstreamLink,
    id: &str,
) -> Result<(), ServiceError> {
    engine.begin_match(id);

    let snap = api::fetch_match(state, id).await?;
    seed_player_cache(state, engine, &snap).await;

    link.subscribe(CHANNEL_MATCHES, format!("{id}.state"));
    link.subscribe(
        CHANNEL_BOARDS,
        format!("{}.events", state.config().board_id),
    );

    // A just-created match pushes nothing until the first throw; an empty
    // throw patch coaxes the initial frame out. Losing it is harmless.
    if let Err(err) = api::kickstart_match(state, id).await {
        warn!(error = %err, match_id = %id, "kickstart request failed");
    }

    let names: Vec<&str> = snap.players.iter().map(|p| p.name.as_str()).collect();
    info!(match_id = %id, players = ?names, "match started");
    broadcast::publish_value(
        state,
        &json!({"event": EVT_MATCH_STARTED, "players": names}),
    );
    Ok(())
}

/// Stop following the current match and tell display clients.
pub fn finish_match(state: &SharedState, engine: &mut MatchEngine) {
    if let Some(id) = engine.active_match_id() {
        info!(match_id = %id, "match ended");
    }
    engine.end_match();
    broadcast::publish_value(state, &json!({"event": EVT_MATCH_ENDED, "players": []}));
}

/// Populate the player cache from a match record.
///
/// Signed-in players seed their countdown average from the account
/// record; everyone else gets the locally stored lifetime value for the
/// variant's statistics family, when a store is available.
pub async fn seed_player_cache(
    state: &SharedState,
    engine: &mut MatchEngine,
    snap: &MatchSnapshot,
) {
    let family = Variant::parse(&snap.variant)
        .map(Variant::seed_family)
        .unwrap_or(StatFamily::X01);
    let store = state.stats_store().await;

    for player in &snap.players {
        if player.name.is_empty() {
            continue;
        }

        let kind = player_kind(player);

        engine.players.insert(
            &player.name,
            CachedPlayer {
                kind,
                stable_index: player.index,
                ..CachedPlayer::default()
            },
        );

        let seeded = match (kind, family) {
            (PlayerKind::Owner | PlayerKind::Registered, StatFamily::X01) => player
                .user
                .as_ref()
                .and_then(|user| user.average),
            _ => match &store {
                Some(store) => match store.overall_stat(family, &player.name).await {
                    Ok(value) => value,
                    Err(err) => {
                        warn!(error = %err, player = %player.name, "lifetime lookup failed");
                        None
                    }
                },
                None => None,
            },
        };
        if let Some(value) = seeded {
            engine.players.set_overall(family, &player.name, value);
        }
    }
}

/// Relation of a roster entry to the local board.
fn player_kind(player: &crate::dto::snapshot::MatchPlayer) -> PlayerKind {
    match (&player.user_id, &player.host_id) {
        (Some(user), Some(host)) if user == host => PlayerKind::Owner,
        _ if player.user.is_some() => PlayerKind::Registered,
        _ => PlayerKind::Guest,
    }
}
