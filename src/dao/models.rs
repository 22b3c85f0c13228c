use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    dto::sync::SaveRequest,
    state::match_state::{TableId, TeamRecord},
};

/// A finished match as handed to the persistence backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SavedMatchEntity {
    /// Unique identifier of this save, taken from the request id when the station sent one.
    /// One match can be saved several times.
    pub id: Uuid,
    /// Table the match was played on.
    pub table_id: TableId,
    /// Game number entered by the operator.
    pub game_number: String,
    /// Time the control station took the snapshot.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// First team record, including its derived score.
    pub team1: TeamRecord,
    /// Second team record, including its derived score.
    pub team2: TeamRecord,
    /// Time the relay received the save request.
    #[serde(with = "time::serde::rfc3339")]
    pub saved_at: OffsetDateTime,
}

impl From<SaveRequest> for SavedMatchEntity {
    fn from(value: SaveRequest) -> Self {
        Self {
            id: value.request_id.unwrap_or_else(Uuid::new_v4),
            table_id: value.table_id,
            game_number: value.game_number,
            timestamp: value.timestamp,
            team1: value.team1,
            team2: value.team2,
            saved_at: OffsetDateTime::now_utc(),
        }
    }
}
