use tokio::time::timeout;

use crate::{
    dto::{
        sync::ScoreUpdate,
        table::{PenaltiesResponse, SavedMatchResponse},
    },
    error::ServiceError,
    state::{SharedState, match_state::TableId},
};

/// The canonical penalty catalog.
pub fn list_penalties(state: &SharedState) -> PenaltiesResponse {
    PenaltiesResponse::from(state.catalog())
}

/// Latest score broadcast for `table`.
pub fn cached_score(state: &SharedState, table: &str) -> Result<ScoreUpdate, ServiceError> {
    let table = TableId::parse(table)?;
    state
        .relay()
        .cached_score(&table)
        .ok_or_else(|| ServiceError::NotFound(format!("no score received for table `{table}`")))
}

/// Most recently persisted match, optionally restricted to one table.
pub async fn latest_game(
    state: &SharedState,
    table: Option<&str>,
) -> Result<SavedMatchResponse, ServiceError> {
    let table = table.map(TableId::parse).transpose()?;
    let store = state.require_match_store().await?;
    let latest = timeout(state.save_timeout(), store.latest_match(table.clone()))
        .await
        .map_err(|_| ServiceError::Timeout)??;

    latest.map(SavedMatchResponse::from).ok_or_else(|| match table {
        Some(table) => ServiceError::NotFound(format!("no saved game for table `{table}`")),
        None => ServiceError::NotFound("no saved game".into()),
    })
}
