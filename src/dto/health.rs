use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Identifier of the match currently being followed, when any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_match_id: Option<String>,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(active_match_id: Option<String>) -> Self {
        Self {
            status: "ok".to_string(),
            active_match_id,
        }
    }

    /// Create a health response indicating the system is in degraded mode.
    pub fn degraded(active_match_id: Option<String>) -> Self {
        Self {
            status: "degraded".to_string(),
            active_match_id,
        }
    }
}
