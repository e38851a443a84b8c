use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Respond with the current health payload while logging connectivity issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.stats_store().await {
        Some(store) => {
            if let Err(err) = store.ping().await {
                warn!(error = %err, "statistics store ping failed");
            }
        }
        None => warn!("statistics store unavailable (degraded mode)"),
    }

    let active = {
        let engine = state.engine().lock().await;
        engine.active_match_id().map(str::to_string)
    };

    if state.is_degraded() {
        HealthResponse::degraded(active)
    } else {
        HealthResponse::ok(active)
    }
}
