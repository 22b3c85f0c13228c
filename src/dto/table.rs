use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::SavedMatchEntity,
    dto::validation::validate_table_id,
    state::{
        match_state::{TableId, TeamRecord},
        penalty::PenaltyCatalog,
    },
};

/// One entry of the penalty catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PenaltyItem {
    /// Identifier stations send back.
    pub code: String,
    /// Human-readable name.
    pub label: String,
    /// Points added to the team score.
    pub delta: i32,
}

/// Penalty catalog in display order.
#[derive(Debug, Serialize, ToSchema)]
pub struct PenaltiesResponse {
    /// Every known penalty.
    pub penalties: Vec<PenaltyItem>,
}

impl From<&PenaltyCatalog> for PenaltiesResponse {
    fn from(catalog: &PenaltyCatalog) -> Self {
        Self {
            penalties: catalog
                .iter()
                .map(|(code, entry)| PenaltyItem {
                    code: code.to_string(),
                    label: entry.label.clone(),
                    delta: entry.delta,
                })
                .collect(),
        }
    }
}

/// Query string of `GET /games/latest`.
#[derive(Debug, Deserialize)]
pub struct LatestGameQuery {
    /// Restrict the lookup to one table.
    #[serde(default)]
    pub table: Option<String>,
}

impl Validate for LatestGameQuery {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(ref table) = self.table {
            if let Err(e) = validate_table_id(table) {
                errors.add("table", e);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// A persisted match as returned by the HTTP API.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SavedMatchResponse {
    /// Record id.
    pub id: Uuid,
    /// Table the match was played on.
    #[schema(value_type = String)]
    pub table_id: TableId,
    /// Game number entered by the referee.
    pub game_number: String,
    /// Last edit of the match before saving.
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub timestamp: OffsetDateTime,
    /// When the store accepted the record.
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub saved_at: OffsetDateTime,
    /// Left team.
    #[schema(value_type = Object)]
    pub team1: TeamRecord,
    /// Right team.
    #[schema(value_type = Object)]
    pub team2: TeamRecord,
}

impl From<SavedMatchEntity> for SavedMatchResponse {
    fn from(value: SavedMatchEntity) -> Self {
        Self {
            id: value.id,
            table_id: value.table_id,
            game_number: value.game_number,
            timestamp: value.timestamp,
            saved_at: value.saved_at,
            team1: value.team1,
            team2: value.team2,
        }
    }
}
