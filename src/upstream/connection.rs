//! Live push connection to the scoring service.
//!
//! One task owns the socket: it forwards outbound subscription frames
//! from the [`UpstreamLink`] channel, routes inbound frames, and keeps
//! the link alive with pings. Any failure tears the connection down and
//! the outer loop dials again after a short delay.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tokio::{
    sync::mpsc,
    time::{Instant, interval, sleep},
};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        self, Message,
        client::IntoClientRequest,
        http::{HeaderValue, header::AUTHORIZATION},
    },
};
use tracing::{debug, info, warn};

use crate::{
    dto::upstream::{CHANNEL_BOARDS, CHANNEL_USERS},
    services::{lifecycle, router},
    state::SharedState,
    upstream::{UpstreamLink, api},
};

/// Pause between reconnect attempts.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);
/// Cadence of outbound pings.
const PING_INTERVAL: Duration = Duration::from_secs(25);
/// Grace period for the matching pong before the link is declared dead.
const PONG_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
enum LinkError {
    #[error("no session token available yet")]
    NotAuthenticated,
    #[error("socket error: {0}")]
    Socket(#[from] tungstenite::Error),
    #[error("invalid authorization header")]
    Header,
    #[error("heartbeat timed out")]
    HeartbeatTimeout,
}

/// Dial the push endpoint forever, serving each connection until it drops.
pub async fn run_connection_loop(state: SharedState) {
    loop {
        match connect_and_serve(&state).await {
            Ok(()) => info!("push connection closed by the service"),
            Err(LinkError::NotAuthenticated) => {
                debug!("waiting for a session before dialing the push endpoint")
            }
            Err(err) => warn!(error = %err, "push connection failed"),
        }
        state.clear_upstream().await;
        sleep(RECONNECT_DELAY).await;
    }
}

async fn connect_and_serve(state: &SharedState) -> Result<(), LinkError> {
    let token = state
        .session()
        .bearer()
        .await
        .ok_or(LinkError::NotAuthenticated)?;

    let mut request = state
        .config()
        .websocket_url
        .as_str()
        .into_client_request()?;
    let header = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|_| LinkError::Header)?;
    request.headers_mut().insert(AUTHORIZATION, header);

    let (mut ws, _response) = connect_async(request).await?;
    info!("push connection established");

    let (tx, mut outbound) = mpsc::unbounded_channel::<String>();
    let link = UpstreamLink::new(tx);
    state.install_upstream(link.clone()).await;

    on_open(state, &link).await;

    let mut ping_timer = interval(PING_INTERVAL);
    ping_timer.tick().await;
    let mut last_pong = Instant::now();

    loop {
        tokio::select! {
            _ = ping_timer.tick() => {
                if last_pong.elapsed() > PING_INTERVAL + PONG_TIMEOUT {
                    return Err(LinkError::HeartbeatTimeout);
                }
                ws.send(Message::Ping(Vec::new().into())).await?;
            }
            frame = outbound.recv() => {
                match frame {
                    Some(text) => ws.send(Message::Text(text.into())).await?,
                    // Every link clone is gone; nothing can use this
                    // connection any more.
                    None => return Ok(()),
                }
            }
            message = ws.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        state.record_raw_frame(&text).await;
                        router::route_frame(state, &link, &text).await;
                    }
                    Some(Ok(Message::Pong(_))) => last_pong = Instant::now(),
                    Some(Ok(Message::Close(_))) | None => return Ok(()),
                    Some(Ok(_)) => {}
                    Some(Err(err)) => return Err(err.into()),
                }
            }
        }
    }
}

/// Connection bootstrap: resolve the board controller address, pick up a
/// match that was already running, and subscribe to our board and user
/// topics.
async fn on_open(state: &SharedState, link: &UpstreamLink) {
    let config = state.config();

    if state.board_address().await.is_none() {
        match api::fetch_board_ip(state).await {
            Ok(Some(ip)) => {
                let address = if ip.starts_with("http") {
                    ip
                } else {
                    format!("http://{ip}")
                };
                info!(%address, "board controller resolved");
                state.set_board_address(address).await;
            }
            Ok(None) => debug!("board registration carries no controller address"),
            Err(err) => warn!(error = %err, "board lookup failed"),
        }
    }

    resume_recent_match(state, link).await;

    link.subscribe(CHANNEL_BOARDS, format!("{}.matches", config.board_id));
    if let Some(user_id) = state.session().user_id().await {
        link.subscribe(CHANNEL_USERS, format!("{user_id}.events"));
    }
}

/// After a restart the service may still have a live match on our board;
/// resume the newest one that is recent enough to plausibly be ongoing.
async fn resume_recent_match(state: &SharedState, link: &UpstreamLink) {
    let matches = match api::list_matches(state).await {
        Ok(matches) => matches,
        Err(err) => {
            warn!(error = %err, "match listing failed; nothing resumed");
            return;
        }
    };

    let board_id = &state.config().board_id;
    let max_age = state.config().reconnect_match_max_age_hours;
    let now = OffsetDateTime::now_utc();

    let mut ours: Vec<&crate::dto::snapshot::MatchSnapshot> = matches
        .iter()
        .filter(|snap| {
            snap.players
                .iter()
                .any(|player| player.board_id.as_deref() == Some(board_id.as_str()))
        })
        .collect();
    ours.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let Some(candidate) = ours.first() else {
        return;
    };
    if !should_resume(candidate.created_at.as_deref(), candidate.finished, max_age, now) {
        debug!(match_id = %candidate.id, "stale match on our board; not resuming");
        return;
    }

    info!(match_id = %candidate.id, "resuming match found at connect time");
    let mut engine = state.engine().lock().await;
    if let Err(err) = lifecycle::start_match(state, &mut engine, link, &candidate.id).await {
        warn!(error = %err, "match resume failed");
    }
}

/// A match is worth resuming when it is unfinished and younger than the
/// configured age cap.
pub(crate) fn should_resume(
    created_at: Option<&str>,
    finished: Option<bool>,
    max_age_hours: i64,
    now: OffsetDateTime,
) -> bool {
    if finished == Some(true) {
        return false;
    }
    let Some(created_at) = created_at else {
        return false;
    };
    let Ok(created) = OffsetDateTime::parse(created_at, &Rfc3339) else {
        return false;
    };
    now - created < time::Duration::hours(max_age_hours)
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::should_resume;

    #[test]
    fn fresh_unfinished_match_is_resumed() {
        let now = datetime!(2025-06-01 12:00:00 UTC);
        assert!(should_resume(
            Some("2025-06-01T11:30:00Z"),
            Some(false),
            2,
            now
        ));
    }

    #[test]
    fn finished_match_is_never_resumed() {
        let now = datetime!(2025-06-01 12:00:00 UTC);
        assert!(!should_resume(
            Some("2025-06-01T11:30:00Z"),
            Some(true),
            2,
            now
        ));
    }

    #[test]
    fn old_match_is_skipped() {
        let now = datetime!(2025-06-01 12:00:00 UTC);
        assert!(!should_resume(
            Some("2025-06-01T08:00:00Z"),
            None,
            2,
            now
        ));
    }

    #[test]
    fn unparsable_timestamp_is_skipped() {
        let now = datetime!(2025-06-01 12:00:00 UTC);
        assert!(!should_resume(Some("yesterday"), None, 2, now));
        assert!(!should_resume(None, None, 2, now));
    }
}
