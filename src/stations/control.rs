//! Scoring station: owns the authoritative [`MatchState`] of every table it scored.

use std::{collections::HashMap, fmt, time::Duration};

use thiserror::Error;
use tokio::{
    sync::{mpsc, watch},
    time::{Instant, sleep_until},
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dto::sync::{SaveRequest, SaveResult, ScoreUpdate, SyncMessage},
    state::{
        match_state::{BallColor, MatchState, TableId, TeamSide},
        penalty::{PenaltyCatalog, PenaltyCode, UnknownPenalty},
    },
    stations::{LinkStatus, reconnected},
};

/// Operator actions accepted by the control station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    /// Switch to `table`, creating an empty match for it on first use.
    SelectTable(TableId),
    /// Add `delta` (possibly negative) to a ball counter.
    AdjustBalls {
        /// Team whose counter changes.
        side: TeamSide,
        /// Counter to change.
        color: BallColor,
        /// Signed change; the counter stops at zero.
        delta: i32,
    },
    /// Replace the penalty sequence of a team.
    SetPenalties {
        /// Penalized team.
        side: TeamSide,
        /// New sequence, duplicates allowed.
        codes: Vec<PenaltyCode>,
    },
    /// Append one penalty.
    AddPenalty {
        /// Penalized team.
        side: TeamSide,
        /// Catalog code.
        code: PenaltyCode,
    },
    /// Remove every occurrence of `code`.
    RemovePenalty {
        /// Penalized team.
        side: TeamSide,
        /// Catalog code.
        code: PenaltyCode,
    },
    /// Set the game number stored with the match.
    SetGameNumber(String),
    /// Rename a team.
    SetTeamName {
        /// Renamed team.
        side: TeamSide,
        /// New display name.
        name: String,
    },
    /// Ask the persistence collaborator to store the current snapshot.
    Save,
    /// Clear the current table back to an empty match. Nothing is published.
    Reset,
}

/// Operator action rejected by the control station. The match is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    /// The code is not in the catalog.
    #[error(transparent)]
    UnknownPenalty(#[from] UnknownPenalty),
    /// The table already waits for a save acknowledgment.
    #[error("a save is already pending for table {0}")]
    SaveInFlight(TableId),
    /// Scoring commands need a selected table.
    #[error("no table selected")]
    NoTableSelected,
}

/// Outcome of asynchronous work the operator must be told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlNotice {
    /// The snapshot was stored; `saved` is now set and broadcast.
    Saved {
        /// Saved table.
        table: TableId,
    },
    /// The persistence collaborator refused the snapshot.
    SaveFailed {
        /// Table whose save failed.
        table: TableId,
        /// Reason given by the collaborator.
        message: String,
    },
    /// No acknowledgment arrived before the save timeout.
    SaveTimedOut {
        /// Table whose save timed out.
        table: TableId,
    },
    /// The snapshot was stored but the match changed meanwhile; save again.
    SaveOutdated {
        /// Table whose stored snapshot is behind.
        table: TableId,
    },
    /// An operator command was refused.
    Rejected(ControlError),
}

impl fmt::Display for ControlNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlNotice::Saved { table } => write!(f, "table {table}: scores saved"),
            ControlNotice::SaveFailed { table, message } => {
                write!(f, "table {table}: save failed: {message}")
            }
            ControlNotice::SaveTimedOut { table } => {
                write!(f, "table {table}: no answer to the save, try again")
            }
            ControlNotice::SaveOutdated { table } => {
                write!(f, "table {table}: scores changed while saving, save again")
            }
            ControlNotice::Rejected(err) => write!(f, "rejected: {err}"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingSave {
    request_id: Uuid,
    revision: u64,
    deadline: Instant,
}

/// Control station state. Drive it with [`ControlStation::run`], or call its methods
/// directly from an existing event loop.
pub struct ControlStation {
    catalog: PenaltyCatalog,
    save_timeout: Duration,
    outbound: mpsc::UnboundedSender<SyncMessage>,
    tables: HashMap<TableId, MatchState>,
    current: Option<TableId>,
    pending: HashMap<TableId, PendingSave>,
}

impl ControlStation {
    /// Station with no table selected, publishing on `outbound`.
    pub fn new(
        catalog: PenaltyCatalog,
        save_timeout: Duration,
        outbound: mpsc::UnboundedSender<SyncMessage>,
    ) -> Self {
        Self {
            catalog,
            save_timeout,
            outbound,
            tables: HashMap::new(),
            current: None,
            pending: HashMap::new(),
        }
    }

    /// Build a station using the configured catalog and save timeout.
    pub fn from_config(config: &AppConfig, outbound: mpsc::UnboundedSender<SyncMessage>) -> Self {
        Self::new(config.penalties().clone(), config.save_timeout(), outbound)
    }

    /// Table currently being scored.
    pub fn current_table(&self) -> Option<&TableId> {
        self.current.as_ref()
    }

    /// Match record of `table`, if it was ever selected.
    pub fn match_state(&self, table: &TableId) -> Option<&MatchState> {
        self.tables.get(table)
    }

    /// Whether a save of `table` awaits its acknowledgment.
    pub fn is_save_pending(&self, table: &TableId) -> bool {
        self.pending.contains_key(table)
    }

    /// Apply an operator command.
    pub fn execute(&mut self, command: ControlCommand) -> Result<(), ControlError> {
        match command {
            ControlCommand::SelectTable(table) => {
                info!(%table, "control station switched table");
                self.tables.entry(table.clone()).or_default();
                self.current = Some(table);
                Ok(())
            }
            ControlCommand::AdjustBalls { side, color, delta } => {
                self.mutate(|state, catalog| {
                    state.set_ball_count(side, color, delta, catalog);
                    Ok(())
                })
            }
            ControlCommand::SetPenalties { side, codes } => {
                self.mutate(|state, catalog| state.set_penalties(side, codes, catalog))
            }
            ControlCommand::AddPenalty { side, code } => {
                self.mutate(|state, catalog| state.add_penalty(side, code, catalog))
            }
            ControlCommand::RemovePenalty { side, code } => self.mutate(|state, catalog| {
                state.remove_penalty(side, &code, catalog).map(|_| ())
            }),
            ControlCommand::SetGameNumber(game_number) => self.mutate(|state, _| {
                state.set_game_number(game_number);
                Ok(())
            }),
            ControlCommand::SetTeamName { side, name } => self.mutate(|state, _| {
                state.set_team_name(side, name);
                Ok(())
            }),
            ControlCommand::Save => self.save(),
            ControlCommand::Reset => {
                let table = self.current.clone().ok_or(ControlError::NoTableSelected)?;
                if let Some(state) = self.tables.get_mut(&table) {
                    state.reset();
                }
                self.pending.remove(&table);
                info!(%table, "match reset");
                Ok(())
            }
        }
    }

    /// Apply `change` to the current table and broadcast the new score.
    fn mutate<F>(&mut self, change: F) -> Result<(), ControlError>
    where
        F: FnOnce(&mut MatchState, &PenaltyCatalog) -> Result<(), UnknownPenalty>,
    {
        let table = self.current.clone().ok_or(ControlError::NoTableSelected)?;
        let state = self.tables.entry(table.clone()).or_default();
        change(state, &self.catalog)?;
        let update = ScoreUpdate::from_match(table, state);
        self.send(SyncMessage::ScoreUpdate(update));
        Ok(())
    }

    fn save(&mut self) -> Result<(), ControlError> {
        let table = self.current.clone().ok_or(ControlError::NoTableSelected)?;
        if self.pending.contains_key(&table) {
            return Err(ControlError::SaveInFlight(table));
        }

        let state = self.tables.entry(table.clone()).or_default();
        let request_id = Uuid::new_v4();
        let request = SaveRequest::from_match(table.clone(), request_id, state);
        self.pending.insert(
            table.clone(),
            PendingSave {
                request_id,
                revision: state.revision(),
                deadline: Instant::now() + self.save_timeout,
            },
        );
        info!(%table, %request_id, game = %request.game_number, "save requested");
        self.send(SyncMessage::SaveRequest(request));
        Ok(())
    }

    /// Process a message delivered by the relay.
    pub fn handle_message(&mut self, message: SyncMessage) -> Option<ControlNotice> {
        match message {
            SyncMessage::SaveResult(result) => self.handle_save_result(result),
            other => {
                debug!(kind = other.kind(), table = %other.table_id(), "control station ignores message");
                None
            }
        }
    }

    /// Only the answer to the pending request counts. Answers to timed out or superseded
    /// requests are dropped and the pending save keeps waiting.
    fn handle_save_result(&mut self, result: SaveResult) -> Option<ControlNotice> {
        let table = result.table_id.clone();
        let Some(pending) = self.pending.get(&table).copied() else {
            debug!(%table, "save result without a pending save");
            return None;
        };
        if result.request_id != Some(pending.request_id) {
            debug!(%table, request_id = ?result.request_id, "save result answers another request");
            return None;
        }
        self.pending.remove(&table);

        if !result.is_success() {
            let message = result
                .message
                .unwrap_or_else(|| "unknown persistence error".to_string());
            warn!(%table, %message, "save failed");
            return Some(ControlNotice::SaveFailed { table, message });
        }

        let state = self.tables.get_mut(&table)?;
        if !state.mark_saved(pending.revision) {
            warn!(%table, "match changed while saving; snapshot acknowledged is outdated");
            return Some(ControlNotice::SaveOutdated { table });
        }

        let update = ScoreUpdate::from_match(table.clone(), state);
        info!(%table, "save acknowledged");
        self.send(SyncMessage::ScoreUpdate(update));
        Some(ControlNotice::Saved { table })
    }

    /// Earliest deadline among pending saves.
    pub fn next_save_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|pending| pending.deadline).min()
    }

    /// Fail every pending save whose deadline is at or before `now`.
    pub fn expire_saves(&mut self, now: Instant) -> Vec<ControlNotice> {
        let expired: Vec<TableId> = self
            .pending
            .iter()
            .filter(|(_, pending)| pending.deadline <= now)
            .map(|(table, _)| table.clone())
            .collect();

        expired
            .into_iter()
            .map(|table| {
                self.pending.remove(&table);
                warn!(%table, "save timed out");
                ControlNotice::SaveTimedOut { table }
            })
            .collect()
    }

    fn send(&self, message: SyncMessage) {
        if self.outbound.send(message).is_err() {
            warn!("relay link closed; message dropped");
        }
    }

    /// Republish the score of every table this station scored.
    ///
    /// The station is the source of truth for its tables, so after a (re)connection it
    /// refreshes the relay cache and every view instead of asking for a score.
    pub fn resync(&self) {
        for (table, state) in &self.tables {
            self.send(SyncMessage::ScoreUpdate(ScoreUpdate::from_match(
                table.clone(),
                state,
            )));
        }
    }

    /// Serialize operator commands, relay messages and save deadlines through one loop.
    ///
    /// Returns when the command channel or the relay link closes.
    pub async fn run(
        mut self,
        mut inbound: mpsc::UnboundedReceiver<SyncMessage>,
        mut status: watch::Receiver<LinkStatus>,
        mut commands: mpsc::UnboundedReceiver<ControlCommand>,
        notices: mpsc::UnboundedSender<ControlNotice>,
    ) {
        if *status.borrow_and_update() == LinkStatus::Connected {
            self.resync();
        }
        loop {
            let deadline = self.next_save_deadline();
            tokio::select! {
                _ = reconnected(&mut status) => {
                    info!("relay reachable; republishing scores");
                    self.resync();
                }
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    if let Err(err) = self.execute(command) {
                        warn!(error = %err, "operator command rejected");
                        let _ = notices.send(ControlNotice::Rejected(err));
                    }
                }
                message = inbound.recv() => {
                    let Some(message) = message else {
                        warn!("relay link closed; stopping control station");
                        break;
                    };
                    if let Some(notice) = self.handle_message(message) {
                        let _ = notices.send(notice);
                    }
                }
                _ = wait_until(deadline) => {
                    for notice in self.expire_saves(Instant::now()) {
                        let _ = notices.send(notice);
                    }
                }
            }
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(id: &str) -> TableId {
        TableId::parse(id).unwrap()
    }

    fn station() -> (ControlStation, mpsc::UnboundedReceiver<SyncMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut station = ControlStation::new(PenaltyCatalog::default(), Duration::from_secs(5), tx);
        station.execute(ControlCommand::SelectTable(table("1"))).unwrap();
        (station, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<SyncMessage>) -> Vec<SyncMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = rx.try_recv() {
            messages.push(message);
        }
        messages
    }

    fn last_update(rx: &mut mpsc::UnboundedReceiver<SyncMessage>) -> ScoreUpdate {
        drain(rx)
            .into_iter()
            .rev()
            .find_map(|message| match message {
                SyncMessage::ScoreUpdate(update) => Some(update),
                _ => None,
            })
            .expect("a score update")
    }

    fn orange(delta: i32) -> ControlCommand {
        ControlCommand::AdjustBalls {
            side: TeamSide::Team1,
            color: BallColor::Orange,
            delta,
        }
    }

    /// Issue a save and return the request that went out.
    fn request_save(
        station: &mut ControlStation,
        rx: &mut mpsc::UnboundedReceiver<SyncMessage>,
    ) -> SaveRequest {
        station.execute(ControlCommand::Save).unwrap();
        drain(rx)
            .into_iter()
            .find_map(|message| match message {
                SyncMessage::SaveRequest(request) => Some(request),
                _ => None,
            })
            .expect("a save request")
    }

    fn succeeded(request: &SaveRequest) -> SyncMessage {
        SyncMessage::SaveResult(
            SaveResult::success(request.table_id.clone(), "ok").answering(request.request_id),
        )
    }

    fn failed(request: &SaveRequest, message: &str) -> SyncMessage {
        SyncMessage::SaveResult(
            SaveResult::error(request.table_id.clone(), message).answering(request.request_id),
        )
    }

    fn save_and_succeed(
        station: &mut ControlStation,
        rx: &mut mpsc::UnboundedReceiver<SyncMessage>,
    ) -> Option<ControlNotice> {
        let request = request_save(station, rx);
        station.handle_message(succeeded(&request))
    }

    #[test]
    fn commands_need_a_table() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut station = ControlStation::new(PenaltyCatalog::default(), Duration::from_secs(5), tx);
        assert_eq!(station.execute(orange(1)), Err(ControlError::NoTableSelected));
        assert_eq!(station.execute(ControlCommand::Save), Err(ControlError::NoTableSelected));
    }

    #[tokio::test]
    async fn mutations_publish_scores_and_clear_saved() {
        let (mut station, mut rx) = station();
        station.execute(orange(5)).unwrap();
        assert_eq!(
            save_and_succeed(&mut station, &mut rx),
            Some(ControlNotice::Saved { table: table("1") })
        );
        assert!(last_update(&mut rx).saved);

        let commands = [
            orange(1),
            ControlCommand::AdjustBalls {
                side: TeamSide::Team2,
                color: BallColor::Purple,
                delta: 1,
            },
            ControlCommand::AddPenalty {
                side: TeamSide::Team1,
                code: "late_start".into(),
            },
            ControlCommand::RemovePenalty {
                side: TeamSide::Team1,
                code: "late_start".into(),
            },
            ControlCommand::SetPenalties {
                side: TeamSide::Team2,
                codes: vec!["wrong_start".into()],
            },
        ];
        for command in commands {
            save_and_succeed(&mut station, &mut rx);
            assert!(station.match_state(&table("1")).unwrap().is_saved());
            station.execute(command).unwrap();
            assert!(!station.match_state(&table("1")).unwrap().is_saved());
            assert!(!last_update(&mut rx).saved);
        }
    }

    #[tokio::test]
    async fn renaming_a_team_needs_a_new_save() {
        let (mut station, mut rx) = station();
        save_and_succeed(&mut station, &mut rx);
        station
            .execute(ControlCommand::SetTeamName {
                side: TeamSide::Team2,
                name: "Owls".into(),
            })
            .unwrap();
        let update = last_update(&mut rx);
        assert_eq!(update.team2_name, "Owls");
        assert!(!update.saved);
    }

    #[tokio::test]
    async fn unknown_penalty_is_rejected_without_publishing() {
        let (mut station, mut rx) = station();
        station.execute(orange(2)).unwrap();
        drain(&mut rx);

        let err = station
            .execute(ControlCommand::AddPenalty {
                side: TeamSide::Team1,
                code: "field_damage".into(),
            })
            .unwrap_err();
        assert_eq!(err, ControlError::UnknownPenalty(UnknownPenalty("field_damage".into())));
        assert!(drain(&mut rx).is_empty());
        assert_eq!(station.match_state(&table("1")).unwrap().team(TeamSide::Team1).score, 2);
    }

    #[tokio::test]
    async fn saved_only_follows_success_for_current_snapshot() {
        let (mut station, mut rx) = station();
        station.execute(orange(3)).unwrap();

        let request = request_save(&mut station, &mut rx);
        assert_eq!(request.team1.score, 3);

        let notice = station.handle_message(failed(&request, "disk full"));
        assert_eq!(
            notice,
            Some(ControlNotice::SaveFailed {
                table: table("1"),
                message: "disk full".into(),
            })
        );
        assert!(!station.match_state(&table("1")).unwrap().is_saved());

        let request = request_save(&mut station, &mut rx);
        station.execute(orange(1)).unwrap();
        let notice = station.handle_message(succeeded(&request));
        assert_eq!(notice, Some(ControlNotice::SaveOutdated { table: table("1") }));
        assert!(!station.match_state(&table("1")).unwrap().is_saved());

        assert_eq!(station.handle_message(succeeded(&request)), None);
        assert!(!station.match_state(&table("1")).unwrap().is_saved());
    }

    #[tokio::test]
    async fn results_must_answer_the_pending_request() {
        let (mut station, mut rx) = station();
        let request = request_save(&mut station, &mut rx);

        let untagged = SyncMessage::SaveResult(SaveResult::success(table("1"), "ok"));
        assert_eq!(station.handle_message(untagged), None);
        let foreign = SyncMessage::SaveResult(
            SaveResult::success(table("1"), "ok").answering(Some(Uuid::new_v4())),
        );
        assert_eq!(station.handle_message(foreign), None);
        assert!(station.is_save_pending(&table("1")));

        assert_eq!(
            station.handle_message(succeeded(&request)),
            Some(ControlNotice::Saved { table: table("1") })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn late_answer_to_timed_out_save_is_not_taken_for_the_retry() {
        let (mut station, mut rx) = station();
        station.execute(orange(3)).unwrap();
        let first = request_save(&mut station, &mut rx);

        tokio::time::advance(Duration::from_secs(6)).await;
        assert_eq!(
            station.expire_saves(Instant::now()),
            vec![ControlNotice::SaveTimedOut { table: table("1") }]
        );

        station.execute(orange(4)).unwrap();
        let second = request_save(&mut station, &mut rx);
        assert_eq!(second.team1.score, 7);
        assert_ne!(first.request_id, second.request_id);

        assert_eq!(station.handle_message(succeeded(&first)), None);
        assert!(!station.match_state(&table("1")).unwrap().is_saved());
        assert!(station.is_save_pending(&table("1")));

        assert_eq!(
            station.handle_message(failed(&second, "disk full")),
            Some(ControlNotice::SaveFailed {
                table: table("1"),
                message: "disk full".into(),
            })
        );
        assert!(!station.match_state(&table("1")).unwrap().is_saved());
        assert!(!station.is_save_pending(&table("1")));
    }

    #[tokio::test]
    async fn second_save_while_pending_is_rejected() {
        let (mut station, _rx) = station();
        station.execute(ControlCommand::Save).unwrap();
        assert_eq!(
            station.execute(ControlCommand::Save),
            Err(ControlError::SaveInFlight(table("1")))
        );

        station.execute(ControlCommand::SelectTable(table("2"))).unwrap();
        assert!(station.execute(ControlCommand::Save).is_ok());
        assert!(station.is_save_pending(&table("1")));
        assert!(station.is_save_pending(&table("2")));
    }

    #[tokio::test(start_paused = true)]
    async fn unanswered_save_times_out() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (relay_tx, relay_rx) = mpsc::unbounded_channel();
        let (_status_tx, status_rx) = watch::channel(LinkStatus::Connected);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (notice_tx, mut notice_rx) = mpsc::unbounded_channel();
        let station = ControlStation::new(PenaltyCatalog::default(), Duration::from_secs(5), tx);
        let task = tokio::spawn(station.run(relay_rx, status_rx, command_rx, notice_tx));

        command_tx.send(ControlCommand::SelectTable(table("1"))).unwrap();
        command_tx.send(ControlCommand::Save).unwrap();
        let Some(SyncMessage::SaveRequest(first)) = rx.recv().await else {
            panic!("expected a save request");
        };

        let started = Instant::now();
        assert_eq!(
            notice_rx.recv().await,
            Some(ControlNotice::SaveTimedOut { table: table("1") })
        );
        assert!(started.elapsed() >= Duration::from_secs(4));

        // A late acknowledgment no longer counts, and a new save is accepted.
        relay_tx.send(succeeded(&first)).unwrap();
        command_tx.send(ControlCommand::Save).unwrap();
        let Some(SyncMessage::SaveRequest(second)) = rx.recv().await else {
            panic!("expected a save request");
        };
        assert_ne!(first.request_id, second.request_id);

        drop(command_tx);
        task.await.unwrap();
        assert!(notice_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn reconnection_republishes_every_table() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let (_relay_tx, relay_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(LinkStatus::Connecting);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (notice_tx, _notice_rx) = mpsc::unbounded_channel();
        let station = ControlStation::new(PenaltyCatalog::default(), Duration::from_secs(5), tx);
        let task = tokio::spawn(station.run(relay_rx, status_rx, command_rx, notice_tx));

        for (id, count) in [("1", 2), ("2", 5)] {
            command_tx.send(ControlCommand::SelectTable(table(id))).unwrap();
            command_tx.send(orange(count)).unwrap();
            assert!(matches!(rx.recv().await, Some(SyncMessage::ScoreUpdate(_))));
        }

        status_tx.send_replace(LinkStatus::Connected);
        let mut republished = Vec::new();
        for _ in 0..2 {
            let Some(SyncMessage::ScoreUpdate(update)) = rx.recv().await else {
                panic!("expected a score update");
            };
            republished.push((update.table_id.to_string(), update.team1_score));
        }
        republished.sort();
        assert_eq!(republished, vec![("1".to_string(), 2), ("2".to_string(), 5)]);

        drop(command_tx);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn reset_clears_without_publishing() {
        let (mut station, mut rx) = station();
        station.execute(orange(4)).unwrap();
        station.execute(ControlCommand::SetGameNumber("3".into())).unwrap();
        drain(&mut rx);

        station.execute(ControlCommand::Reset).unwrap();
        let state = station.match_state(&table("1")).unwrap();
        assert_eq!(state.team(TeamSide::Team1).orange_count, 0);
        assert_eq!(state.game_number(), "");
        assert!(!state.is_saved());
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn tables_are_isolated() {
        let (mut station, mut rx) = station();
        station.execute(orange(2)).unwrap();
        station.execute(ControlCommand::SelectTable(table("2"))).unwrap();
        station.execute(orange(7)).unwrap();
        assert_eq!(last_update(&mut rx).table_id, table("2"));

        assert_eq!(station.match_state(&table("1")).unwrap().team(TeamSide::Team1).score, 2);
        assert_eq!(station.match_state(&table("2")).unwrap().team(TeamSide::Team1).score, 7);

        station.execute(ControlCommand::SelectTable(table("1"))).unwrap();
        assert_eq!(station.current_table(), Some(&table("1")));
        assert_eq!(station.match_state(&table("1")).unwrap().team(TeamSide::Team1).score, 2);
    }
}
