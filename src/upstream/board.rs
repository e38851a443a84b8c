//! REST client for the board controller on the local network.
//!
//! The controller address is resolved once at connect time from the
//! board registration; every operation fails with an invalid-state
//! error while it is unknown.

use std::time::Duration;

use serde_json::{Value, json};

use crate::{error::ServiceError, state::SharedState};

const BOARD_TIMEOUT: Duration = Duration::from_secs(5);

async fn base_url(state: &SharedState) -> Result<String, ServiceError> {
    state.board_address().await.ok_or_else(|| {
        ServiceError::InvalidState("board controller address is not known yet".into())
    })
}

/// Start throw detection.
pub async fn start(state: &SharedState) -> Result<Value, ServiceError> {
    put(state, "api/start").await
}

/// Stop throw detection.
pub async fn stop(state: &SharedState) -> Result<Value, ServiceError> {
    put(state, "api/stop").await
}

/// Clear the current detection state, used after a manual takeout.
pub async fn reset(state: &SharedState) -> Result<Value, ServiceError> {
    post(state, "api/reset").await
}

/// Run automatic calibration, optionally restricted to one camera.
pub async fn calibrate(
    state: &SharedState,
    cam_id: Option<i64>,
    distortion: bool,
) -> Result<Value, ServiceError> {
    let path = match cam_id {
        Some(id) => format!("api/config/calibration/auto/{id}?distortion={distortion}"),
        None => format!("api/config/calibration/auto?distortion={distortion}"),
    };
    post(state, &path).await
}

/// Restart the controller process.
pub async fn restart(state: &SharedState) -> Result<Value, ServiceError> {
    post(state, "api/restart").await
}

/// Read the controller configuration.
pub async fn config(state: &SharedState) -> Result<Value, ServiceError> {
    get(state, "api/config").await
}

/// Patch the controller configuration.
pub async fn patch_config(state: &SharedState, changes: &Value) -> Result<Value, ServiceError> {
    let url = format!("{}/api/config", base_url(state).await?);
    let response = state
        .http()
        .patch(url)
        .timeout(BOARD_TIMEOUT)
        .json(changes)
        .send()
        .await?
        .error_for_status()?;
    into_body(response).await
}

/// Detection statistics of the running session.
pub async fn stats(state: &SharedState) -> Result<Value, ServiceError> {
    get(state, "api/state/stats").await
}

/// Camera availability.
pub async fn cams_state(state: &SharedState) -> Result<Value, ServiceError> {
    get(state, "api/cams/state").await
}

/// Per-camera frame statistics.
pub async fn cams_stats(state: &SharedState) -> Result<Value, ServiceError> {
    get(state, "api/cams/stats").await
}

async fn get(state: &SharedState, path: &str) -> Result<Value, ServiceError> {
    let url = format!("{}/{path}", base_url(state).await?);
    let response = state
        .http()
        .get(url)
        .timeout(BOARD_TIMEOUT)
        .send()
        .await?
        .error_for_status()?;
    into_body(response).await
}

async fn put(state: &SharedState, path: &str) -> Result<Value, ServiceError> {
    let url = format!("{}/{path}", base_url(state).await?);
    let response = state
        .http()
        .put(url)
        .timeout(BOARD_TIMEOUT)
        .send()
        .await?
        .error_for_status()?;
    into_body(response).await
}

async fn post(state: &SharedState, path: &str) -> Result<Value, ServiceError> {
    let url = format!("{}/{path}", base_url(state).await?);
    let response = state
        .http()
        .post(url)
        .timeout(BOARD_TIMEOUT)
        .send()
        .await?
        .error_for_status()?;
    into_body(response).await
}

/// Controllers answer some commands with an empty body; normalize that
/// to a small status object so callers always get JSON back.
async fn into_body(response: reqwest::Response) -> Result<Value, ServiceError> {
    let text = response.text().await?;
    if text.trim().is_empty() {
        return Ok(json!({"status": "ok"}));
    }
    Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
}
