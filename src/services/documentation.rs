use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Oche Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::event_stream,
        crate::routes::sse::raw_stream,
        crate::routes::state::current_state,
        crate::routes::state::supported_modes,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::command::CommandEnvelope,
            crate::dto::command::CommandResponse,
            crate::dto::event::GameEvent,
            crate::dto::event::GameState,
            crate::dto::event::MatchRules,
            crate::dto::event::PlayerKind,
            crate::dto::event::PlayerState,
            crate::dto::event::RoundTarget,
            crate::dto::event::ScoreValue,
            crate::dto::event::TurnState,
            crate::dto::event::WinKind,
            crate::dto::event::WinnerInfo,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "state", description = "Scoreboard state queries"),
        (name = "commands", description = "WebSocket operations for control clients"),
    )
)]
pub struct ApiDoc;
