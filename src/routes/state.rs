use axum::{Json, Router, extract::State, routing::get};
use serde_json::{Value, json};

use crate::{engine::variant::SUPPORTED_VARIANTS, error::AppError, state::SharedState};

#[utoipa::path(
    get,
    path = "/api/state",
    responses((status = 200, description = "Most recent scoreboard event, `{}` before the first frame", body = Object))
)]
/// Return the most recent scoreboard event for late-joining displays.
pub async fn current_state(State(state): State<SharedState>) -> Result<Json<Value>, AppError> {
    let engine = state.engine().lock().await;
    let payload = match engine.last_event() {
        Some(event) => serde_json::to_value(event)
            .map_err(|err| AppError::Internal(format!("unserializable state: {err}")))?,
        None => json!({}),
    };
    Ok(Json(payload))
}

#[utoipa::path(
    get,
    path = "/api/supported-modes",
    responses((status = 200, description = "Game variants this backend can process", body = [String]))
)]
/// List the supported game variants.
pub async fn supported_modes() -> Json<Vec<&'static str>> {
    Json(SUPPORTED_VARIANTS.to_vec())
}

/// Configure the scoreboard state routes.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/state", get(current_state))
        .route("/supported-modes", get(supported_modes))
}
