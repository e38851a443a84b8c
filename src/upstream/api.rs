//! REST client for the scoring service.
//!
//! Thin request helpers: every operation authenticates with the current
//! session token and surfaces failures as [`ServiceError`] for the
//! command layer to report.

use std::time::Duration;

use serde_json::{Map, Value, json};

use crate::{
    dto::snapshot::MatchSnapshot,
    error::ServiceError,
    state::SharedState,
};

/// Timeout for interactive match commands.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(5);
/// Timeout for match listings at reconnect time.
const LISTING_TIMEOUT: Duration = Duration::from_secs(10);

async fn bearer(state: &SharedState) -> Result<String, ServiceError> {
    state
        .session()
        .bearer()
        .await
        .ok_or(ServiceError::NotAuthenticated)
}

/// Fetch the full record of one match.
pub async fn fetch_match(state: &SharedState, id: &str) -> Result<MatchSnapshot, ServiceError> {
    let url = format!("{}{id}", state.config().matches_url);
    let response = state
        .http()
        .get(url)
        .bearer_auth(bearer(state).await?)
        .timeout(LISTING_TIMEOUT)
        .send()
        .await?
        .error_for_status()?;
    Ok(response.json().await?)
}

/// List the account's current matches.
pub async fn list_matches(state: &SharedState) -> Result<Vec<MatchSnapshot>, ServiceError> {
    let response = state
        .http()
        .get(state.config().matches_url.clone())
        .bearer_auth(bearer(state).await?)
        .timeout(LISTING_TIMEOUT)
        .send()
        .await?
        .error_for_status()?;
    Ok(response.json().await?)
}

/// Nudge a freshly started match with an empty throw patch so the
/// service pushes an initial state frame.
pub async fn kickstart_match(state: &SharedState, id: &str) -> Result<(), ServiceError> {
    let url = format!("{}{id}/throws", state.config().matches_url);
    state
        .http()
        .patch(url)
        .bearer_auth(bearer(state).await?)
        .timeout(COMMAND_TIMEOUT)
        .json(&json!({}))
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}

/// Revert the most recent throw.
pub async fn undo_throw(state: &SharedState, match_id: &str) -> Result<Value, ServiceError> {
    post_match_action(state, match_id, "undo").await
}

/// Skip to the next player.
pub async fn next_player(state: &SharedState, match_id: &str) -> Result<Value, ServiceError> {
    post_match_action(state, match_id, "players/next").await
}

/// Advance to the next leg.
pub async fn next_game(state: &SharedState, match_id: &str) -> Result<Value, ServiceError> {
    post_match_action(state, match_id, "games/next").await
}

async fn post_match_action(
    state: &SharedState,
    match_id: &str,
    action: &str,
) -> Result<Value, ServiceError> {
    let url = format!("{}{match_id}/{action}", state.config().matches_url);
    state
        .http()
        .post(url)
        .bearer_auth(bearer(state).await?)
        .timeout(COMMAND_TIMEOUT)
        .send()
        .await?
        .error_for_status()?;
    Ok(json!({"status": "ok"}))
}

/// Start the match from a waiting lobby.
pub async fn start_lobby_match(state: &SharedState, lobby_id: &str) -> Result<Value, ServiceError> {
    let url = format!("{}{lobby_id}/start", state.config().lobbies_url);
    state
        .http()
        .post(url)
        .bearer_auth(bearer(state).await?)
        .timeout(COMMAND_TIMEOUT)
        .send()
        .await?
        .error_for_status()?;
    Ok(json!({"status": "ok"}))
}

/// Rewrite already-registered throws of the running turn.
pub async fn correct_throws(
    state: &SharedState,
    match_id: &str,
    throw_indices: &[i64],
    score: i64,
) -> Result<Value, ServiceError> {
    let mut changes = Map::new();
    for index in throw_indices {
        changes.insert(
            index.to_string(),
            json!({"point": score, "type": "normal"}),
        );
    }
    let url = format!("{}{match_id}/throws", state.config().matches_url);
    state
        .http()
        .patch(url)
        .bearer_auth(bearer(state).await?)
        .timeout(COMMAND_TIMEOUT)
        .json(&json!({"changes": Value::Object(changes)}))
        .send()
        .await?
        .error_for_status()?;
    Ok(json!({"status": "ok"}))
}

/// Lifetime countdown average of an account, from the service's own
/// statistics endpoint.
pub async fn user_x01_average(
    state: &SharedState,
    user_id: &str,
) -> Result<Option<f64>, ServiceError> {
    let url = format!("{}{user_id}/stats/x01", state.config().users_url);
    let response = state
        .http()
        .get(url)
        .query(&[("limit", "100")])
        .bearer_auth(bearer(state).await?)
        .timeout(COMMAND_TIMEOUT)
        .send()
        .await?
        .error_for_status()?;
    let body: Value = response.json().await?;
    Ok(body
        .get("average")
        .and_then(|value| value.get("average"))
        .and_then(Value::as_f64))
}

/// Address of the board controller backing our board, when registered.
pub async fn fetch_board_ip(state: &SharedState) -> Result<Option<String>, ServiceError> {
    let config = state.config();
    let url = format!("{}{}", config.boards_url, config.board_id);
    let response = state
        .http()
        .get(url)
        .bearer_auth(bearer(state).await?)
        .timeout(COMMAND_TIMEOUT)
        .send()
        .await?
        .error_for_status()?;
    let body: Value = response.json().await?;
    Ok(body
        .get("ip")
        .and_then(Value::as_str)
        .filter(|ip| !ip.is_empty())
        .map(|ip| ip.trim_end_matches('/').to_string()))
}
