use axum::Router;

use crate::state::SharedState;

/// OpenAPI and Swagger UI.
pub mod docs;
/// Liveness and readiness.
pub mod health;
/// Per-table event streams.
pub mod sse;
/// Scores, penalties and saved games.
pub mod tables;
/// Station sync channel.
pub mod websocket;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(websocket::router())
        .merge(tables::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
