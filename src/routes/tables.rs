use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use axum_valid::Valid;

use crate::{
    dto::{
        sync::ScoreUpdate,
        table::{LatestGameQuery, PenaltiesResponse, SavedMatchResponse},
    },
    error::AppError,
    services::table_service,
    state::SharedState,
};

/// Read-only endpoints for entry UIs and displays that cannot hold a websocket.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/penalties", get(list_penalties))
        .route("/tables/{tableId}/score", get(table_score))
        .route("/games/latest", get(latest_game))
}

#[utoipa::path(
    get,
    path = "/penalties",
    tag = "tables",
    responses((status = 200, description = "Penalty catalog", body = PenaltiesResponse))
)]
/// Return the penalty codes accepted by the scorer, with labels and deltas.
pub async fn list_penalties(State(state): State<SharedState>) -> Json<PenaltiesResponse> {
    Json(table_service::list_penalties(&state))
}

#[utoipa::path(
    get,
    path = "/tables/{tableId}/score",
    tag = "tables",
    params(("tableId" = String, Path, description = "Table identifier")),
    responses(
        (status = 200, description = "Latest score of the table", body = ScoreUpdate),
        (status = 400, description = "Invalid table id"),
        (status = 404, description = "No score received yet")
    )
)]
/// Return the latest score broadcast for a table.
pub async fn table_score(
    State(state): State<SharedState>,
    Path(table_id): Path<String>,
) -> Result<Json<ScoreUpdate>, AppError> {
    let payload = table_service::cached_score(&state, &table_id)?;
    Ok(Json(payload))
}

#[utoipa::path(
    get,
    path = "/games/latest",
    tag = "tables",
    params(("table" = Option<String>, Query, description = "Restrict the lookup to one table")),
    responses(
        (status = 200, description = "Most recently saved game", body = SavedMatchResponse),
        (status = 400, description = "Invalid table id"),
        (status = 404, description = "No saved game"),
        (status = 503, description = "Match store unavailable")
    )
)]
/// Return the most recently saved game, optionally for one table.
pub async fn latest_game(
    State(state): State<SharedState>,
    Valid(Query(query)): Valid<Query<LatestGameQuery>>,
) -> Result<Json<SavedMatchResponse>, AppError> {
    let payload = table_service::latest_game(&state, query.table.as_deref()).await?;
    Ok(Json(payload))
}
