use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI document for the tennis relay.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::table_stream,
        crate::routes::websocket::ws_handler,
        crate::routes::tables::list_penalties,
        crate::routes::tables::table_score,
        crate::routes::tables::latest_game,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::sse::Handshake,
            crate::dto::sync::RequestScore,
            crate::dto::sync::ScoreUpdate,
            crate::dto::sync::SaveRequest,
            crate::dto::sync::SaveResult,
            crate::dto::sync::SaveStatus,
            crate::dto::table::PenaltyItem,
            crate::dto::table::PenaltiesResponse,
            crate::dto::table::SavedMatchResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "stations", description = "WebSocket sync channel for control and view stations"),
        (name = "tables", description = "Scores, penalties and saved games"),
    )
)]
/// OpenAPI document of the relay.
pub struct ApiDoc;
