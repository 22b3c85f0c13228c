//! Wire format of the sync channel shared by stations and the relay.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::match_state::{MatchState, TableId, TeamRecord, TeamSide};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
/// Messages exchanged between stations through the relay, keyed by `kind`.
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SyncMessage {
    /// Pull of the latest score of a table.
    RequestScore(RequestScore),
    /// Broadcast of the canonical score of a table.
    ScoreUpdate(ScoreUpdate),
    /// Ask the persistence collaborator to store a finished match.
    SaveRequest(SaveRequest),
    /// Answer of the persistence collaborator.
    SaveResult(SaveResult),
}

impl SyncMessage {
    /// Parse a JSON text frame.
    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Routing key of the message.
    pub fn table_id(&self) -> &TableId {
        match self {
            Self::RequestScore(msg) => &msg.table_id,
            Self::ScoreUpdate(msg) => &msg.table_id,
            Self::SaveRequest(msg) => &msg.table_id,
            Self::SaveResult(msg) => &msg.table_id,
        }
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RequestScore(_) => "requestScore",
            Self::ScoreUpdate(_) => "scoreUpdate",
            Self::SaveRequest(_) => "saveRequest",
            Self::SaveResult(_) => "saveResult",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Request for the latest known score of a table.
pub struct RequestScore {
    /// Table whose score is wanted.
    #[schema(value_type = String)]
    pub table_id: TableId,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Canonical score of a table as computed by its control station.
pub struct ScoreUpdate {
    /// Table the score belongs to.
    #[schema(value_type = String)]
    pub table_id: TableId,
    /// Display name of team 1.
    pub team1_name: String,
    /// Display name of team 2.
    pub team2_name: String,
    /// Derived score of team 1.
    pub team1_score: u32,
    /// Derived score of team 2.
    pub team2_score: u32,
    /// Whether this snapshot was acknowledged by the persistence collaborator.
    pub saved: bool,
}

impl ScoreUpdate {
    /// Build the broadcast for `state`.
    pub fn from_match(table_id: TableId, state: &MatchState) -> Self {
        let team1 = state.team(TeamSide::Team1);
        let team2 = state.team(TeamSide::Team2);
        Self {
            table_id,
            team1_name: team1.name.clone(),
            team2_name: team2.name.clone(),
            team1_score: team1.score,
            team2_score: team2.score,
            saved: state.is_saved(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Full snapshot of a match to persist.
pub struct SaveRequest {
    /// Table the match was played on.
    #[schema(value_type = String)]
    pub table_id: TableId,
    /// Correlation token echoed by the matching [`SaveResult`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Uuid>,
    /// Game number entered by the operator.
    pub game_number: String,
    /// When the snapshot was taken.
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub timestamp: OffsetDateTime,
    /// Record of team 1.
    #[schema(value_type = Object)]
    pub team1: TeamRecord,
    /// Record of team 2.
    #[schema(value_type = Object)]
    pub team2: TeamRecord,
}

impl SaveRequest {
    /// Snapshot `state` for persistence as request `request_id`, stamped with the current
    /// time.
    pub fn from_match(table_id: TableId, request_id: Uuid, state: &MatchState) -> Self {
        Self {
            table_id,
            request_id: Some(request_id),
            game_number: state.game_number().to_string(),
            timestamp: OffsetDateTime::now_utc(),
            team1: state.team(TeamSide::Team1).clone(),
            team2: state.team(TeamSide::Team2).clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
/// Outcome of a save.
pub enum SaveStatus {
    /// The snapshot was stored.
    Success,
    /// The snapshot was not stored; see the message.
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Acknowledgment of a [`SaveRequest`].
pub struct SaveResult {
    /// Table of the acknowledged save.
    #[schema(value_type = String)]
    pub table_id: TableId,
    /// `requestId` of the acknowledged [`SaveRequest`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<Uuid>,
    /// Whether the snapshot was stored.
    pub status: SaveStatus,
    /// Text shown to the operator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SaveResult {
    /// Positive acknowledgment.
    pub fn success(table_id: TableId, message: impl Into<String>) -> Self {
        Self {
            table_id,
            request_id: None,
            status: SaveStatus::Success,
            message: Some(message.into()),
        }
    }

    /// Negative acknowledgment carrying the reason shown to the operator.
    pub fn error(table_id: TableId, message: impl Into<String>) -> Self {
        Self {
            table_id,
            request_id: None,
            status: SaveStatus::Error,
            message: Some(message.into()),
        }
    }

    /// Tie the acknowledgment to the request it answers.
    pub fn answering(mut self, request_id: Option<Uuid>) -> Self {
        self.request_id = request_id;
        self
    }

    /// Whether the save succeeded.
    pub fn is_success(&self) -> bool {
        self.status == SaveStatus::Success
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::state::{match_state::BallColor, penalty::PenaltyCatalog};

    fn table(id: &str) -> TableId {
        TableId::parse(id).unwrap()
    }

    #[test]
    fn score_update_wire_shape() {
        let message = SyncMessage::ScoreUpdate(ScoreUpdate {
            table_id: table("1"),
            team1_name: "Lions".into(),
            team2_name: "Owls".into(),
            team1_score: 7,
            team2_score: 3,
            saved: false,
        });

        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "kind": "scoreUpdate",
                "tableId": "1",
                "team1Name": "Lions",
                "team2Name": "Owls",
                "team1Score": 7,
                "team2Score": 3,
                "saved": false,
            })
        );
    }

    #[test]
    fn parses_request_score_and_save_result() {
        let message = SyncMessage::from_json_str(r#"{"kind":"requestScore","tableId":"2"}"#).unwrap();
        assert_eq!(message.table_id(), &table("2"));
        assert_eq!(message.kind(), "requestScore");

        let message =
            SyncMessage::from_json_str(r#"{"kind":"saveResult","tableId":"1","status":"error","message":"disk full"}"#)
                .unwrap();
        let SyncMessage::SaveResult(result) = message else {
            panic!("expected save result");
        };
        assert!(!result.is_success());
        assert_eq!(result.message.as_deref(), Some("disk full"));
        assert_eq!(result.request_id, None);

        let message = SyncMessage::from_json_str(
            r#"{"kind":"saveResult","tableId":"1","requestId":"67e55044-10b1-426f-9247-bb680e5fe0c8","status":"success"}"#,
        )
        .unwrap();
        let SyncMessage::SaveResult(result) = message else {
            panic!("expected save result");
        };
        assert_eq!(
            result.request_id,
            Some(Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap())
        );
    }

    #[test]
    fn rejects_invalid_table_ids_and_unknown_kinds() {
        assert!(SyncMessage::from_json_str(r#"{"kind":"requestScore","tableId":""}"#).is_err());
        assert!(SyncMessage::from_json_str(r#"{"kind":"buzz","tableId":"1"}"#).is_err());
        assert!(SyncMessage::from_json_str(r#"{"kind":"requestScore"}"#).is_err());
    }

    #[test]
    fn save_request_snapshots_the_match() {
        let catalog = PenaltyCatalog::default();
        let mut state = MatchState::new();
        state.set_game_number("14");
        state.set_team_name(TeamSide::Team1, "Lions");
        state.set_ball_count(TeamSide::Team1, BallColor::Orange, 4, &catalog);

        let request_id = Uuid::new_v4();
        let request = SaveRequest::from_match(table("1"), request_id, &state);
        let value = serde_json::to_value(SyncMessage::SaveRequest(request.clone())).unwrap();
        assert_eq!(value["kind"], "saveRequest");
        assert_eq!(value["gameNumber"], "14");
        assert_eq!(value["requestId"], request_id.to_string());
        assert_eq!(value["team1"]["orangeCount"], 4);
        assert_eq!(value["team1"]["score"], 4);
        assert!(value["timestamp"].is_string());

        let back: SyncMessage = serde_json::from_value(value).unwrap();
        assert_eq!(back, SyncMessage::SaveRequest(request));
    }
}
