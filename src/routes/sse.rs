use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::Sse,
    routing::get,
};
use futures::Stream;
use tracing::info;

use crate::{
    error::{AppError, ServiceError},
    services::sse_service,
    state::{SharedState, match_state::TableId},
};

#[utoipa::path(
    get,
    path = "/sse/tables/{tableId}",
    tag = "sse",
    params(("tableId" = String, Path, description = "Table to follow")),
    responses(
        (status = 200, description = "Score and save events of one table", content_type = "text/event-stream", body = String),
        (status = 400, description = "Invalid table id"),
        (status = 503, description = "Too many tables followed")
    )
)]
/// Stream the `scoreUpdate` and `saveResult` events of one table.
pub async fn table_stream(
    State(state): State<SharedState>,
    Path(table_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>>, AppError> {
    let table = TableId::parse(table_id).map_err(ServiceError::from)?;
    let (receiver, initial) = sse_service::subscribe_table(&state, &table)?;
    info!(%table, "New table SSE connection");
    Ok(sse_service::to_sse_stream(state, receiver, initial, table))
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/tables/{tableId}", get(table_stream))
}
