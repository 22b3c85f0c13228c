//! Phases a view station walks through while following a table, from table selection to
//! the reset after the winner is shown.

use serde::Serialize;
use thiserror::Error;

use crate::state::match_state::TableId;

/// High-level phases a view station cycles through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    /// Waiting for the operator to pick the table to follow.
    TableSelect,
    /// Preparation countdown before the match.
    Prep,
    /// The match itself, see [`GameStage`].
    Game(GameStage),
    /// Outcome is displayed.
    Winner,
    /// Between two matches on the same table.
    Reset,
}

/// Fine-grained stage while in [`MatchPhase::Game`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStage {
    /// "Press to start" is shown; the game countdown has not begun.
    AwaitingStart,
    /// Game countdown is running.
    Running,
    /// Game countdown reached zero but the scores were not saved yet.
    Expired,
}

/// Coarse phase name exposed to displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VisiblePhase {
    /// See [`MatchPhase::TableSelect`].
    TableSelect,
    /// See [`MatchPhase::Prep`].
    Prep,
    /// See [`MatchPhase::Game`].
    Game,
    /// See [`MatchPhase::Winner`].
    Winner,
    /// See [`MatchPhase::Reset`].
    Reset,
}

impl From<MatchPhase> for VisiblePhase {
    fn from(value: MatchPhase) -> Self {
        match value {
            MatchPhase::TableSelect => VisiblePhase::TableSelect,
            MatchPhase::Prep => VisiblePhase::Prep,
            MatchPhase::Game(_) => VisiblePhase::Game,
            MatchPhase::Winner => VisiblePhase::Winner,
            MatchPhase::Reset => VisiblePhase::Reset,
        }
    }
}

/// Events that can be applied to the phase machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseEvent {
    /// Operator chose the table to follow.
    SelectTable(TableId),
    /// Operator asked to go back to table selection.
    ChangeTable,
    /// Operator pressed the advance key.
    Advance,
    /// Prep countdown reached zero.
    PrepExpired,
    /// Game countdown reached zero.
    GameExpired,
    /// The persistence layer acknowledged the scores of the followed table.
    SaveConfirmed,
}

/// Error returned when an event cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhaseError {
    /// The event has no meaning in the current phase.
    #[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
    InvalidTransition {
        /// Phase the machine was in.
        from: MatchPhase,
        /// Rejected event.
        event: PhaseEvent,
    },
    /// The winner was requested before the scores were saved.
    #[error("scores must be saved before showing the winner")]
    PrematureWinnerRequest,
}

/// Result of a successfully applied event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Phase before the event.
    pub from: MatchPhase,
    /// Phase after the event; may equal `from` for re-entries.
    pub to: MatchPhase,
}

/// Snapshot of the machine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase.
    pub phase: MatchPhase,
    /// Followed table, once selected.
    pub table: Option<TableId>,
    /// Number of applied transitions.
    pub version: usize,
}

/// Per-view-station phase machine. Timers and I/O are driven by the owning station.
#[derive(Debug, Clone)]
pub struct MatchPhaseMachine {
    phase: MatchPhase,
    table: Option<TableId>,
    game_expired: bool,
    version: usize,
}

impl Default for MatchPhaseMachine {
    fn default() -> Self {
        Self {
            phase: MatchPhase::TableSelect,
            table: None,
            game_expired: false,
            version: 0,
        }
    }
}

impl MatchPhaseMachine {
    /// Create a machine waiting for a table choice.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// Followed table, if one was selected.
    pub fn table(&self) -> Option<&TableId> {
        self.table.as_ref()
    }

    /// Whether the game countdown ran out during the current cycle.
    pub fn game_expired(&self) -> bool {
        self.game_expired
    }

    /// Create a snapshot of the current state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            table: self.table.clone(),
            version: self.version,
        }
    }

    /// Apply `event`, where `saved` is the latest known save flag of the followed table.
    pub fn apply(&mut self, event: PhaseEvent, saved: bool) -> Result<Transition, PhaseError> {
        let from = self.phase;
        let to = self.compute_transition(&event, saved)?;

        match (&event, to) {
            (PhaseEvent::SelectTable(table), _) => self.table = Some(table.clone()),
            (PhaseEvent::ChangeTable, _) => self.table = None,
            (PhaseEvent::GameExpired, _) => self.game_expired = true,
            _ => {}
        }
        if to == MatchPhase::Prep {
            self.game_expired = false;
        }

        self.phase = to;
        self.version += 1;
        Ok(Transition { from, to })
    }

    /// Compute the next phase for `event` without changing anything.
    fn compute_transition(&self, event: &PhaseEvent, saved: bool) -> Result<MatchPhase, PhaseError> {
        let next = match (self.phase, event) {
            (MatchPhase::TableSelect, PhaseEvent::SelectTable(_)) => MatchPhase::Prep,
            (MatchPhase::Prep | MatchPhase::Reset, PhaseEvent::ChangeTable) => {
                MatchPhase::TableSelect
            }
            (MatchPhase::Prep, PhaseEvent::Advance | PhaseEvent::PrepExpired) => {
                MatchPhase::Game(GameStage::AwaitingStart)
            }
            (MatchPhase::Game(GameStage::AwaitingStart), PhaseEvent::Advance) => {
                MatchPhase::Game(GameStage::Running)
            }
            (
                MatchPhase::Game(GameStage::Running | GameStage::Expired),
                PhaseEvent::Advance,
            ) => {
                if !saved {
                    return Err(PhaseError::PrematureWinnerRequest);
                }
                MatchPhase::Winner
            }
            (MatchPhase::Game(GameStage::Running), PhaseEvent::GameExpired) => {
                if saved {
                    MatchPhase::Winner
                } else {
                    MatchPhase::Game(GameStage::Expired)
                }
            }
            (MatchPhase::Winner, PhaseEvent::SaveConfirmed) if self.game_expired => {
                MatchPhase::Winner
            }
            (MatchPhase::Winner, PhaseEvent::Advance) => MatchPhase::Reset,
            (MatchPhase::Reset, PhaseEvent::Advance) => MatchPhase::Prep,
            (from, event) => {
                return Err(PhaseError::InvalidTransition {
                    from,
                    event: event.clone(),
                });
            }
        };

        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(id: &str) -> TableId {
        TableId::parse(id).unwrap()
    }

    fn apply(sm: &mut MatchPhaseMachine, event: PhaseEvent, saved: bool) -> MatchPhase {
        sm.apply(event, saved).unwrap().to
    }

    fn running_game() -> MatchPhaseMachine {
        let mut sm = MatchPhaseMachine::new();
        apply(&mut sm, PhaseEvent::SelectTable(table("1")), false);
        apply(&mut sm, PhaseEvent::Advance, false);
        apply(&mut sm, PhaseEvent::Advance, false);
        assert_eq!(sm.phase(), MatchPhase::Game(GameStage::Running));
        sm
    }

    #[test]
    fn initial_state_is_table_select() {
        let sm = MatchPhaseMachine::new();
        assert_eq!(sm.phase(), MatchPhase::TableSelect);
        assert!(sm.table().is_none());
    }

    #[test]
    fn full_happy_path_through_a_match() {
        let mut sm = MatchPhaseMachine::new();
        assert_eq!(
            apply(&mut sm, PhaseEvent::SelectTable(table("2")), false),
            MatchPhase::Prep
        );
        assert_eq!(sm.table(), Some(&table("2")));
        assert_eq!(
            apply(&mut sm, PhaseEvent::PrepExpired, false),
            MatchPhase::Game(GameStage::AwaitingStart)
        );
        assert_eq!(
            apply(&mut sm, PhaseEvent::Advance, false),
            MatchPhase::Game(GameStage::Running)
        );
        assert_eq!(apply(&mut sm, PhaseEvent::Advance, true), MatchPhase::Winner);
        assert_eq!(apply(&mut sm, PhaseEvent::Advance, true), MatchPhase::Reset);
        assert_eq!(apply(&mut sm, PhaseEvent::Advance, true), MatchPhase::Prep);
        assert_eq!(sm.table(), Some(&table("2")));
        assert_eq!(sm.snapshot().version, 6);
    }

    #[test]
    fn manual_advance_without_save_is_refused() {
        let mut sm = running_game();
        assert_eq!(
            sm.apply(PhaseEvent::Advance, false),
            Err(PhaseError::PrematureWinnerRequest)
        );
        assert_eq!(sm.phase(), MatchPhase::Game(GameStage::Running));
    }

    #[test]
    fn expiry_without_save_stays_in_game() {
        let mut sm = running_game();
        assert_eq!(
            apply(&mut sm, PhaseEvent::GameExpired, false),
            MatchPhase::Game(GameStage::Expired)
        );
        assert!(sm.game_expired());
        assert_eq!(
            sm.apply(PhaseEvent::Advance, false),
            Err(PhaseError::PrematureWinnerRequest)
        );
        assert_eq!(apply(&mut sm, PhaseEvent::Advance, true), MatchPhase::Winner);
    }

    #[test]
    fn expiry_with_save_shows_winner() {
        let mut sm = running_game();
        assert_eq!(apply(&mut sm, PhaseEvent::GameExpired, true), MatchPhase::Winner);
    }

    #[test]
    fn save_confirmation_reenters_winner_only_after_expiry() {
        let mut sm = running_game();
        apply(&mut sm, PhaseEvent::Advance, true);
        assert!(matches!(
            sm.apply(PhaseEvent::SaveConfirmed, true),
            Err(PhaseError::InvalidTransition { .. })
        ));

        let mut sm = running_game();
        apply(&mut sm, PhaseEvent::GameExpired, false);
        apply(&mut sm, PhaseEvent::Advance, true);
        let transition = sm.apply(PhaseEvent::SaveConfirmed, true).unwrap();
        assert_eq!(transition.from, MatchPhase::Winner);
        assert_eq!(transition.to, MatchPhase::Winner);
    }

    #[test]
    fn table_can_only_change_outside_a_match() {
        let mut sm = running_game();
        assert!(matches!(
            sm.apply(PhaseEvent::SelectTable(table("2")), true),
            Err(PhaseError::InvalidTransition { .. })
        ));
        assert!(sm.apply(PhaseEvent::ChangeTable, true).is_err());
        assert_eq!(sm.table(), Some(&table("1")));

        let mut sm = MatchPhaseMachine::new();
        apply(&mut sm, PhaseEvent::SelectTable(table("2")), false);
        assert_eq!(
            apply(&mut sm, PhaseEvent::ChangeTable, false),
            MatchPhase::TableSelect
        );
        assert!(sm.table().is_none());
        apply(&mut sm, PhaseEvent::SelectTable(table("1")), false);
        assert_eq!(sm.table(), Some(&table("1")));
    }

    #[test]
    fn entering_prep_clears_expiry_marker() {
        let mut sm = running_game();
        apply(&mut sm, PhaseEvent::GameExpired, true);
        assert!(sm.game_expired());
        apply(&mut sm, PhaseEvent::Advance, true);
        apply(&mut sm, PhaseEvent::Advance, true);
        assert_eq!(sm.phase(), MatchPhase::Prep);
        assert!(!sm.game_expired());
    }

    #[test]
    fn stray_expiry_is_invalid() {
        let mut sm = MatchPhaseMachine::new();
        let err = sm.apply(PhaseEvent::GameExpired, true).unwrap_err();
        assert_eq!(
            err,
            PhaseError::InvalidTransition {
                from: MatchPhase::TableSelect,
                event: PhaseEvent::GameExpired,
            }
        );
    }
}
