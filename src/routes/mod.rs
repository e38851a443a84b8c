use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod health;
pub mod sse;
pub mod state;
pub mod websocket;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(shared: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(state::router())
        .merge(websocket::router());

    let docs_router = docs::router(shared.clone());

    Router::new()
        .nest("/api", api_router)
        .merge(docs_router)
        .with_state(shared)
}
