//! Authoritative per-table match record owned by the control station.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

use crate::state::{
    penalty::{PenaltyCatalog, PenaltyCode, UnknownPenalty},
    scoring::compute_score,
};

const TABLE_ID_MAX_LEN: usize = 16;

/// Identifier of one physical match table (`"1"`, `"2"`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableId(String);

/// Raised when a table identifier is empty, too long or contains unexpected characters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid table id `{0}`: expected 1 to 16 ASCII letters, digits or dashes")]
pub struct InvalidTableId(pub String);

impl TableId {
    /// Validate and wrap a raw identifier.
    pub fn parse(raw: impl Into<String>) -> Result<Self, InvalidTableId> {
        let raw = raw.into();
        let valid = !raw.is_empty()
            && raw.len() <= TABLE_ID_MAX_LEN
            && raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        if valid {
            Ok(Self(raw))
        } else {
            Err(InvalidTableId(raw))
        }
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TableId {
    type Error = InvalidTableId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<TableId> for String {
    fn from(value: TableId) -> Self {
        value.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One of the two teams playing on a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamSide {
    /// Team listed first on the scoring sheet.
    Team1,
    /// Team listed second on the scoring sheet.
    Team2,
}

/// Ball colors counted by the referee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BallColor {
    /// Worth [`crate::state::scoring::ORANGE_VALUE`] each.
    Orange,
    /// Worth [`crate::state::scoring::PURPLE_VALUE`] each.
    Purple,
}

/// Counters, penalties and derived score of one team.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRecord {
    /// Display name of the team.
    pub name: String,
    /// Orange balls on the opponent's half.
    pub orange_count: u32,
    /// Purple balls on the opponent's half.
    pub purple_count: u32,
    /// Penalties in the order they were given; duplicates allowed.
    pub penalties: Vec<PenaltyCode>,
    /// Derived from the other fields, never edited directly.
    pub score: u32,
}

impl TeamRecord {
    fn count_mut(&mut self, color: BallColor) -> &mut u32 {
        match color {
            BallColor::Orange => &mut self.orange_count,
            BallColor::Purple => &mut self.purple_count,
        }
    }
}

/// Live record of the match played on one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchState {
    game_number: String,
    team1: TeamRecord,
    team2: TeamRecord,
    saved: bool,
    timestamp: OffsetDateTime,
    revision: u64,
}

impl Default for MatchState {
    fn default() -> Self {
        Self {
            game_number: String::new(),
            team1: TeamRecord::default(),
            team2: TeamRecord::default(),
            saved: false,
            timestamp: OffsetDateTime::now_utc(),
            revision: 0,
        }
    }
}

impl MatchState {
    /// Empty record for a freshly selected table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Game number entered by the operator.
    pub fn game_number(&self) -> &str {
        &self.game_number
    }

    /// Read access to one team.
    pub fn team(&self, side: TeamSide) -> &TeamRecord {
        match side {
            TeamSide::Team1 => &self.team1,
            TeamSide::Team2 => &self.team2,
        }
    }

    /// Whether the current record was acknowledged by the persistence layer.
    pub fn is_saved(&self) -> bool {
        self.saved
    }

    /// Time of the last edit.
    pub fn timestamp(&self) -> OffsetDateTime {
        self.timestamp
    }

    /// Counter bumped by every edit of the record, used to pair save acknowledgments with
    /// the snapshot they cover.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Add `delta` to a ball counter, never going below zero.
    pub fn set_ball_count(
        &mut self,
        side: TeamSide,
        color: BallColor,
        delta: i32,
        catalog: &PenaltyCatalog,
    ) {
        let count = self.team_mut(side).count_mut(color);
        let next = (i64::from(*count) + i64::from(delta)).max(0);
        *count = u32::try_from(next).unwrap_or(u32::MAX);
        self.scoring_inputs_changed(side, catalog);
    }

    /// Replace the whole penalty sequence of a team.
    ///
    /// Unknown codes reject the call and leave the record untouched.
    pub fn set_penalties(
        &mut self,
        side: TeamSide,
        codes: Vec<PenaltyCode>,
        catalog: &PenaltyCatalog,
    ) -> Result<(), UnknownPenalty> {
        catalog.validate(&codes)?;
        self.team_mut(side).penalties = codes;
        self.scoring_inputs_changed(side, catalog);
        Ok(())
    }

    /// Append one penalty to a team.
    pub fn add_penalty(
        &mut self,
        side: TeamSide,
        code: PenaltyCode,
        catalog: &PenaltyCatalog,
    ) -> Result<(), UnknownPenalty> {
        catalog.delta(&code)?;
        self.team_mut(side).penalties.push(code);
        self.scoring_inputs_changed(side, catalog);
        Ok(())
    }

    /// Remove every occurrence of `code` from a team; returns whether anything was removed.
    pub fn remove_penalty(
        &mut self,
        side: TeamSide,
        code: &PenaltyCode,
        catalog: &PenaltyCatalog,
    ) -> Result<bool, UnknownPenalty> {
        catalog.delta(code)?;
        let penalties = &mut self.team_mut(side).penalties;
        let before = penalties.len();
        penalties.retain(|existing| existing != code);
        let removed = penalties.len() != before;
        if removed {
            self.scoring_inputs_changed(side, catalog);
        }
        Ok(removed)
    }

    /// Set the game number shown on saved records.
    pub fn set_game_number(&mut self, game_number: impl Into<String>) {
        self.game_number = game_number.into();
        self.record_changed();
    }

    /// Rename a team. The stored record carries the name, so the match needs saving again.
    pub fn set_team_name(&mut self, side: TeamSide, name: impl Into<String>) {
        self.team_mut(side).name = name.into();
        self.record_changed();
    }

    /// Record a successful save of `revision`.
    ///
    /// Returns `false` and leaves the flag cleared when the record changed after the save
    /// request was sent.
    pub(crate) fn mark_saved(&mut self, revision: u64) -> bool {
        if revision != self.revision {
            return false;
        }
        self.saved = true;
        true
    }

    /// Clear everything back to an empty match.
    pub fn reset(&mut self) {
        let revision = self.revision + 1;
        *self = Self {
            revision,
            ..Self::default()
        };
    }

    fn team_mut(&mut self, side: TeamSide) -> &mut TeamRecord {
        match side {
            TeamSide::Team1 => &mut self.team1,
            TeamSide::Team2 => &mut self.team2,
        }
    }

    fn scoring_inputs_changed(&mut self, side: TeamSide, catalog: &PenaltyCatalog) {
        let team = self.team_mut(side);
        let score = compute_score(team, catalog);
        team.score = score;
        self.record_changed();
    }

    /// Anything a [`SaveRequest`](crate::dto::sync::SaveRequest) snapshots changed.
    fn record_changed(&mut self) {
        self.saved = false;
        self.revision += 1;
        self.timestamp = OffsetDateTime::now_utc();
    }
}
