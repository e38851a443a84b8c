//! Session lifecycle against the identity provider.
//!
//! A background loop logs in with the password grant, renews the access
//! token ahead of expiry with the refresh grant, and falls back to a
//! full re-login whenever the refresh grant is rejected. The rest of the
//! application only ever sees the [`SessionHandle`].

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::{sync::RwLock, time::Instant, time::sleep};
use tracing::{debug, info, warn};

use crate::state::SharedState;

/// Fraction of a token's lifetime after which it is renewed.
const RENEWAL_FRACTION: f64 = 0.75;
/// Cadence of the refresh loop.
const TICK: Duration = Duration::from_secs(3);

/// Live session published to the rest of the application.
#[derive(Clone, Debug)]
pub struct Session {
    /// Bearer token for REST calls and the push connection.
    pub access_token: String,
    /// Account id of the signed-in user.
    pub user_id: String,
}

/// Shared read handle over the current session.
#[derive(Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionHandle {
    /// Current bearer token, `None` while logged out.
    pub async fn bearer(&self) -> Option<String> {
        self.inner
            .read()
            .await
            .as_ref()
            .map(|session| session.access_token.clone())
    }

    /// Account id of the signed-in user, `None` while logged out.
    pub async fn user_id(&self) -> Option<String> {
        self.inner
            .read()
            .await
            .as_ref()
            .map(|session| session.user_id.clone())
    }

    async fn replace(&self, session: Option<Session>) {
        *self.inner.write().await = session;
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
}

struct Tokens {
    access: String,
    refresh: Option<String>,
    renew_at: Instant,
}

/// Keep the session alive for the lifetime of the process.
pub async fn run_credential_refresh(state: SharedState) {
    let mut tokens: Option<Tokens> = None;
    let mut user_id: Option<String> = None;

    loop {
        let due = tokens
            .as_ref()
            .map(|current| Instant::now() >= current.renew_at)
            .unwrap_or(true);

        if due {
            tokens = renew(&state, tokens.take()).await;
            match &tokens {
                Some(current) => {
                    if user_id.is_none() {
                        user_id = fetch_user_id(&state, &current.access).await;
                    }
                    match &user_id {
                        Some(id) => {
                            state
                                .session()
                                .replace(Some(Session {
                                    access_token: current.access.clone(),
                                    user_id: id.clone(),
                                }))
                                .await;
                        }
                        None => {
                            // Token without identity is useless; retry the
                            // whole login next tick.
                            tokens = None;
                            state.session().replace(None).await;
                        }
                    }
                }
                None => state.session().replace(None).await,
            }
        }

        sleep(TICK).await;
    }
}

/// Renew via the refresh grant when possible, otherwise log in again.
async fn renew(state: &SharedState, previous: Option<Tokens>) -> Option<Tokens> {
    if let Some(refresh) = previous.and_then(|tokens| tokens.refresh) {
        match refresh_grant(state, &refresh).await {
            Ok(tokens) => {
                debug!("access token renewed");
                return Some(tokens);
            }
            Err(err) => {
                warn!(error = %err, "token refresh rejected; logging in again");
            }
        }
    }

    match password_grant(state).await {
        Ok(tokens) => {
            info!("logged in to the scoring service");
            Some(tokens)
        }
        Err(err) => {
            warn!(error = %err, "login failed");
            None
        }
    }
}

fn token_endpoint(state: &SharedState) -> String {
    let config = state.config();
    format!(
        "{}/realms/{}/protocol/openid-connect/token",
        config.auth_url, config.realm
    )
}

async fn password_grant(state: &SharedState) -> Result<Tokens, reqwest::Error> {
    let config = state.config();
    let response = state
        .http()
        .post(token_endpoint(state))
        .form(&[
            ("grant_type", "password"),
            ("client_id", config.client_id.as_str()),
            ("username", config.user_email.as_str()),
            ("password", config.user_password.as_str()),
        ])
        .send()
        .await?
        .error_for_status()?;
    Ok(into_tokens(response.json().await?))
}

async fn refresh_grant(state: &SharedState, refresh: &str) -> Result<Tokens, reqwest::Error> {
    let config = state.config();
    let response = state
        .http()
        .post(token_endpoint(state))
        .form(&[
            ("grant_type", "refresh_token"),
            ("client_id", config.client_id.as_str()),
            ("refresh_token", refresh),
        ])
        .send()
        .await?
        .error_for_status()?;
    Ok(into_tokens(response.json().await?))
}

fn into_tokens(token: TokenResponse) -> Tokens {
    let lifetime = Duration::from_secs_f64(token.expires_in as f64 * RENEWAL_FRACTION);
    Tokens {
        access: token.access_token,
        refresh: token.refresh_token,
        renew_at: Instant::now() + lifetime,
    }
}

async fn fetch_user_id(state: &SharedState, access: &str) -> Option<String> {
    let config = state.config();
    let url = format!(
        "{}/realms/{}/protocol/openid-connect/userinfo",
        config.auth_url, config.realm
    );
    let result = state
        .http()
        .get(url)
        .bearer_auth(access)
        .send()
        .await
        .and_then(|response| response.error_for_status());
    match result {
        Ok(response) => match response.json::<UserInfo>().await {
            Ok(info) => Some(info.sub),
            Err(err) => {
                warn!(error = %err, "malformed userinfo response");
                None
            }
        },
        Err(err) => {
            warn!(error = %err, "userinfo request failed");
            None
        }
    }
}
