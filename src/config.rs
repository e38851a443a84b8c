//! Application-level configuration loading for the scoring bridge.
//!
//! Settings come from an optional JSON file first, then environment
//! variables override individual fields. Credentials and the board id are
//! mandatory; everything else has sensible hosted-service defaults.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "OCHE_BACK_CONFIG_PATH";

/// Default identity provider base URL.
const DEFAULT_AUTH_URL: &str = "https://login.autodarts.io";
/// Default identity provider realm.
const DEFAULT_REALM: &str = "autodarts";
/// Default OAuth client id used for the password grant.
const DEFAULT_CLIENT_ID: &str = "autodarts-app";
/// Default match REST endpoint.
const DEFAULT_MATCHES_URL: &str = "https://api.autodarts.io/gs/v0/matches/";
/// Default lobby REST endpoint.
const DEFAULT_LOBBIES_URL: &str = "https://api.autodarts.io/gs/v0/lobbies/";
/// Default board REST endpoint.
const DEFAULT_BOARDS_URL: &str = "https://api.autodarts.io/bs/v0/boards/";
/// Default user REST endpoint.
const DEFAULT_USERS_URL: &str = "https://api.autodarts.io/as/v0/users/";
/// Default push subscription endpoint.
const DEFAULT_WEBSOCKET_URL: &str = "wss://api.autodarts.io/ms/v0/subscribe";
/// How old (in hours) an unfinished match may be and still be resumed on reconnect.
const DEFAULT_RECONNECT_MAX_AGE_HOURS: i64 = 2;

/// Errors raised while assembling the runtime configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A credential the upstream session cannot be established without.
    #[error("missing required setting `{0}`")]
    MissingRequired(&'static str),
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Account email used for the password grant.
    pub user_email: String,
    /// Account password used for the password grant.
    pub user_password: String,
    /// OAuth client id presented to the identity provider.
    pub client_id: String,
    /// Identifier of the board this bridge follows.
    pub board_id: String,
    /// Identity provider base URL.
    pub auth_url: String,
    /// Identity provider realm.
    pub realm: String,
    /// Match REST endpoint (trailing slash).
    pub matches_url: String,
    /// Lobby REST endpoint (trailing slash).
    pub lobbies_url: String,
    /// Board REST endpoint (trailing slash).
    pub boards_url: String,
    /// User REST endpoint (trailing slash).
    pub users_url: String,
    /// Push subscription endpoint.
    pub websocket_url: String,
    /// SQLite database URL for the statistics store, `None` disables persistence.
    pub database_url: Option<String>,
    /// Maximum age of an unfinished match eligible for resumption.
    pub reconnect_match_max_age_hours: i64,
}

impl AppConfig {
    /// Load the configuration from disk and the environment.
    ///
    /// File values act as defaults; environment variables win. Missing
    /// credentials or board id are fatal.
    pub fn load() -> Result<Self, ConfigError> {
        let raw = read_config_file();

        let user_email = env_or(raw.user_email.clone(), "AUTODARTS_USER_EMAIL")
            .ok_or(ConfigError::MissingRequired("AUTODARTS_USER_EMAIL"))?;
        let user_password = env_or(raw.user_password.clone(), "AUTODARTS_USER_PASSWORD")
            .ok_or(ConfigError::MissingRequired("AUTODARTS_USER_PASSWORD"))?;
        let board_id = env_or(raw.board_id.clone(), "AUTODARTS_BOARD_ID")
            .ok_or(ConfigError::MissingRequired("AUTODARTS_BOARD_ID"))?;

        let database_url = env_or(raw.database_url.clone(), "DATABASE_URL");
        if database_url.is_none() {
            warn!("no DATABASE_URL configured; statistics persistence disabled");
        }

        let reconnect_match_max_age_hours =
            env_or(None, "RECONNECT_MATCH_MAX_AGE_HOURS")
                .and_then(|value| value.parse::<i64>().ok())
                .or(raw.reconnect_match_max_age_hours)
                .unwrap_or(DEFAULT_RECONNECT_MAX_AGE_HOURS);

        Ok(Self {
            user_email,
            user_password,
            client_id: env_or(raw.client_id, "AUTODARTS_CLIENT_ID")
                .unwrap_or_else(|| DEFAULT_CLIENT_ID.into()),
            board_id,
            auth_url: env_or(raw.auth_url, "AUTODARTS_AUTH_URL")
                .unwrap_or_else(|| DEFAULT_AUTH_URL.into()),
            realm: env_or(raw.realm, "AUTODARTS_REALM").unwrap_or_else(|| DEFAULT_REALM.into()),
            matches_url: env_or(raw.matches_url, "AUTODARTS_MATCHES_URL")
                .unwrap_or_else(|| DEFAULT_MATCHES_URL.into()),
            lobbies_url: env_or(raw.lobbies_url, "AUTODARTS_LOBBIES_URL")
                .unwrap_or_else(|| DEFAULT_LOBBIES_URL.into()),
            boards_url: env_or(raw.boards_url, "AUTODARTS_BOARDS_URL")
                .unwrap_or_else(|| DEFAULT_BOARDS_URL.into()),
            users_url: env_or(raw.users_url, "AUTODARTS_USERS_URL")
                .unwrap_or_else(|| DEFAULT_USERS_URL.into()),
            websocket_url: env_or(raw.websocket_url, "AUTODARTS_WEBSOCKET_URL")
                .unwrap_or_else(|| DEFAULT_WEBSOCKET_URL.into()),
            database_url,
            reconnect_match_max_age_hours,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    user_email: Option<String>,
    user_password: Option<String>,
    client_id: Option<String>,
    board_id: Option<String>,
    auth_url: Option<String>,
    realm: Option<String>,
    matches_url: Option<String>,
    lobbies_url: Option<String>,
    boards_url: Option<String>,
    users_url: Option<String>,
    websocket_url: Option<String>,
    database_url: Option<String>,
    reconnect_match_max_age_hours: Option<i64>,
}

/// Read the optional JSON configuration file, tolerating its absence.
fn read_config_file() -> RawConfig {
    let path = resolve_config_path();
    match fs::read_to_string(&path) {
        Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
            Ok(raw) => {
                info!(path = %path.display(), "loaded configuration file");
                raw
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to parse config file; using environment only"
                );
                RawConfig::default()
            }
        },
        Err(err) if err.kind() == ErrorKind::NotFound => RawConfig::default(),
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "failed to read config file; using environment only"
            );
            RawConfig::default()
        }
    }
}

/// Environment variable override with a file-provided fallback.
fn env_or(fallback: Option<String>, key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .filter(|value| !value.is_empty())
        .or(fallback)
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
