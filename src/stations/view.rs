//! Display station: follows one table, runs the match countdowns and shows the winner.

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::{
    config::AppConfig,
    dto::sync::{RequestScore, SaveResult, ScoreUpdate, SyncMessage},
    state::{
        match_state::TableId,
        phase_machine::{
            GameStage, MatchPhase, MatchPhaseMachine, PhaseError, PhaseEvent, Transition,
            VisiblePhase,
        },
        timer::{Timer, TimerEvent},
    },
    stations::{LinkStatus, reconnected},
};

/// Operator inputs of a view station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCommand {
    /// Follow `table`; only meaningful during table selection.
    SelectTable(TableId),
    /// Go back to table selection; only meaningful in prep or reset.
    ChangeTable,
    /// The single "next" key.
    Advance,
}

/// Non-fatal problems reported to the view operator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewWarning {
    /// The winner was requested while the scores of the match are not saved.
    #[error("save the game scores before showing the winner")]
    ScoresNotSaved,
    /// The input has no meaning in the current phase.
    #[error(transparent)]
    Rejected(PhaseError),
}

impl From<PhaseError> for ViewWarning {
    fn from(err: PhaseError) -> Self {
        match err {
            PhaseError::PrematureWinnerRequest => ViewWarning::ScoresNotSaved,
            other => ViewWarning::Rejected(other),
        }
    }
}

/// Result of a finished match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    /// Team 1 scored more.
    Team1,
    /// Team 2 scored more.
    Team2,
    /// Equal scores are an explicit outcome, never a win for either side.
    Tie,
}

impl MatchOutcome {
    /// Compare the two scores of `update`.
    pub fn from_scores(update: &ScoreUpdate) -> Self {
        match update.team1_score.cmp(&update.team2_score) {
            std::cmp::Ordering::Greater => MatchOutcome::Team1,
            std::cmp::Ordering::Less => MatchOutcome::Team2,
            std::cmp::Ordering::Equal => MatchOutcome::Tie,
        }
    }

    /// Text shown on the winner page.
    pub fn headline(&self, update: &ScoreUpdate) -> String {
        match self {
            MatchOutcome::Team1 => format!("{} Wins!", update.team1_name),
            MatchOutcome::Team2 => format!("{} Wins!", update.team2_name),
            MatchOutcome::Tie => "It's a tie!".to_string(),
        }
    }
}

/// Everything a renderer needs to draw the current page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewDisplay {
    /// Page to draw.
    pub phase: VisiblePhase,
    /// Followed table, once selected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<TableId>,
    /// Seconds left on the countdown shown by the page.
    pub remaining_seconds: u32,
    /// Whether that countdown is moving.
    pub timer_running: bool,
    /// Game page waits for the start key.
    pub awaiting_start: bool,
    /// Game countdown ran out before the scores were saved.
    pub scores_not_saved: bool,
    /// Saved flag of the latest score.
    pub saved: bool,
    /// Latest score of the followed table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<ScoreUpdate>,
    /// Result shown on the winner page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<MatchOutcome>,
}

/// View station state.
///
/// The station keeps a read-through cache of the followed table's score. The `saved` flag of
/// the latest [`ScoreUpdate`] gates the winner page; entering the game clears it so each match
/// starts unsaved.
pub struct ViewStation {
    machine: MatchPhaseMachine,
    timer: Timer,
    timer_tx: mpsc::UnboundedSender<TimerEvent>,
    timer_rx: mpsc::UnboundedReceiver<TimerEvent>,
    outbound: mpsc::UnboundedSender<SyncMessage>,
    prep_seconds: u32,
    game_seconds: u32,
    remaining: u32,
    score: Option<ScoreUpdate>,
    saved: bool,
    outcome: Option<MatchOutcome>,
}

impl ViewStation {
    /// Station in table selection, publishing on `outbound`.
    pub fn new(
        prep_seconds: u32,
        game_seconds: u32,
        outbound: mpsc::UnboundedSender<SyncMessage>,
    ) -> Self {
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        Self {
            machine: MatchPhaseMachine::new(),
            timer: Timer::new(),
            timer_tx,
            timer_rx,
            outbound,
            prep_seconds,
            game_seconds,
            remaining: 0,
            score: None,
            saved: false,
            outcome: None,
        }
    }

    /// Build a station using the configured countdown lengths.
    pub fn from_config(config: &AppConfig, outbound: mpsc::UnboundedSender<SyncMessage>) -> Self {
        Self::new(config.prep_seconds(), config.game_seconds(), outbound)
    }

    /// Current phase, including game sub-stages.
    pub fn phase(&self) -> MatchPhase {
        self.machine.phase()
    }

    /// Followed table.
    pub fn table(&self) -> Option<&TableId> {
        self.machine.table()
    }

    /// Saved flag as last broadcast for the followed table.
    pub fn is_saved(&self) -> bool {
        self.saved
    }

    /// Result of the match, once the winner page was entered.
    pub fn outcome(&self) -> Option<MatchOutcome> {
        self.outcome
    }

    /// Snapshot for renderers.
    pub fn display(&self) -> ViewDisplay {
        let phase = self.machine.phase();
        ViewDisplay {
            phase: phase.into(),
            table: self.machine.table().cloned(),
            remaining_seconds: self.remaining,
            timer_running: self.timer.is_running(),
            awaiting_start: phase == MatchPhase::Game(GameStage::AwaitingStart),
            scores_not_saved: phase == MatchPhase::Game(GameStage::Expired),
            saved: self.saved,
            score: self.score.clone(),
            outcome: self.outcome,
        }
    }

    /// Apply an operator input.
    pub fn execute(&mut self, command: ViewCommand) -> Result<Transition, ViewWarning> {
        let event = match command {
            ViewCommand::SelectTable(table) => PhaseEvent::SelectTable(table),
            ViewCommand::ChangeTable => PhaseEvent::ChangeTable,
            ViewCommand::Advance => PhaseEvent::Advance,
        };
        self.apply(event)
    }

    /// Process a message delivered by the relay. Messages for other tables are ignored.
    pub fn handle_message(&mut self, message: SyncMessage) -> Option<Transition> {
        if self.machine.table() != Some(message.table_id()) {
            debug!(kind = message.kind(), table = %message.table_id(), "ignoring message for another table");
            return None;
        }

        match message {
            SyncMessage::ScoreUpdate(update) => {
                self.ingest_score(update);
                None
            }
            SyncMessage::SaveResult(result) => self.handle_save_result(&result),
            other => {
                debug!(kind = other.kind(), "view station ignores message");
                None
            }
        }
    }

    /// Process a countdown event. Events of cancelled or superseded runs are dropped.
    pub fn handle_timer(&mut self, event: TimerEvent) -> Result<Option<Transition>, ViewWarning> {
        if !self.timer.is_current(event.id()) {
            debug!(timer = %event.id(), "ignoring stale timer event");
            return Ok(None);
        }

        match event {
            TimerEvent::Tick { remaining, .. } => {
                self.remaining = remaining;
                Ok(None)
            }
            TimerEvent::Expired { id } => {
                self.timer.finish(id);
                self.remaining = 0;
                let event = match self.machine.phase() {
                    MatchPhase::Prep => PhaseEvent::PrepExpired,
                    _ => PhaseEvent::GameExpired,
                };
                self.apply(event).map(Some)
            }
        }
    }

    /// Ask the relay for the latest score of the followed table, e.g. after (re)connecting.
    pub fn request_score(&self) {
        if let Some(table) = self.machine.table() {
            self.send(SyncMessage::RequestScore(RequestScore {
                table_id: table.clone(),
            }));
        }
    }

    fn ingest_score(&mut self, update: ScoreUpdate) {
        self.saved = update.saved;
        if self.machine.phase() == MatchPhase::Winner {
            self.outcome = Some(MatchOutcome::from_scores(&update));
        }
        self.score = Some(update);
    }

    fn handle_save_result(&mut self, result: &SaveResult) -> Option<Transition> {
        if !result.is_success() {
            return None;
        }
        // Only meaningful after the game countdown ran out while the winner page is shown.
        match self.machine.apply(PhaseEvent::SaveConfirmed, self.saved) {
            Ok(transition) => {
                self.enter(transition.to);
                Some(transition)
            }
            Err(_) => None,
        }
    }

    fn apply(&mut self, event: PhaseEvent) -> Result<Transition, ViewWarning> {
        let transition = self
            .machine
            .apply(event, self.saved)
            .map_err(ViewWarning::from)?;
        info!(from = ?transition.from, to = ?transition.to, "view phase changed");
        self.enter(transition.to);
        Ok(transition)
    }

    /// Entry actions of `phase`. The previous countdown is always cancelled first.
    fn enter(&mut self, phase: MatchPhase) {
        match phase {
            MatchPhase::TableSelect => {
                self.timer.cancel();
                self.remaining = 0;
                self.score = None;
                self.saved = false;
                self.outcome = None;
            }
            MatchPhase::Prep => {
                self.outcome = None;
                self.start_countdown(self.prep_seconds);
                self.request_score();
            }
            MatchPhase::Game(GameStage::AwaitingStart) => {
                self.timer.cancel();
                self.remaining = self.game_seconds;
                self.saved = false;
            }
            MatchPhase::Game(GameStage::Running) => {
                self.start_countdown(self.game_seconds);
            }
            MatchPhase::Game(GameStage::Expired) => {
                warn!(table = ?self.machine.table(), "game over but scores are not saved");
            }
            MatchPhase::Winner => {
                self.timer.cancel();
                self.outcome = self.score.as_ref().map(MatchOutcome::from_scores);
                self.request_score();
            }
            MatchPhase::Reset => {
                self.timer.cancel();
            }
        }
    }

    fn start_countdown(&mut self, seconds: u32) {
        self.timer.cancel();
        self.remaining = seconds;
        self.timer.start(seconds, self.timer_tx.clone());
    }

    fn send(&self, message: SyncMessage) {
        if self.outbound.send(message).is_err() {
            warn!("relay link closed; message dropped");
        }
    }

    /// Serialize operator inputs, relay messages and countdown ticks through one loop,
    /// publishing a fresh [`ViewDisplay`] after each of them. Every (re)connection reported
    /// on `status` asks the relay for the followed table's score.
    ///
    /// Returns when the command channel or the relay link closes.
    pub async fn run(
        mut self,
        mut inbound: mpsc::UnboundedReceiver<SyncMessage>,
        mut status: watch::Receiver<LinkStatus>,
        mut commands: mpsc::UnboundedReceiver<ViewCommand>,
        display: watch::Sender<ViewDisplay>,
        warnings: mpsc::UnboundedSender<ViewWarning>,
    ) {
        if *status.borrow_and_update() == LinkStatus::Connected {
            self.request_score();
        }
        display.send_replace(self.display());
        loop {
            let outcome = tokio::select! {
                _ = reconnected(&mut status) => {
                    info!(table = ?self.machine.table(), "relay reachable; requesting score");
                    self.request_score();
                    Ok(())
                }
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    self.execute(command).map(|_| ())
                }
                message = inbound.recv() => {
                    let Some(message) = message else {
                        warn!("relay link closed; stopping view station");
                        break;
                    };
                    self.handle_message(message);
                    Ok(())
                }
                Some(event) = self.timer_rx.recv() => {
                    self.handle_timer(event).map(|_| ())
                }
            };

            if let Err(warning) = outcome {
                warn!(%warning, "view input rejected");
                let _ = warnings.send(warning);
            }
            let next = self.display();
            display.send_if_modified(|current| {
                let changed = *current != next;
                if changed {
                    *current = next;
                }
                changed
            });
        }
        self.timer.cancel();
    }
}
