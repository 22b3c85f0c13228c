//! Station roles that talk to the relay: one control station editing scores and any number
//! of view stations following a table.

pub mod client;
pub mod console;
pub mod control;
pub mod view;

use tokio::sync::{mpsc, watch};

use crate::dto::sync::SyncMessage;

/// Reachability of the relay as seen by a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus {
    /// Not connected; messages sent meanwhile are queued.
    Connecting,
    /// Connected. Every switch to this state is a fresh session.
    Connected,
}

/// Duplex connection between a station and the relay.
///
/// Obtained from [`client::connect`] for remote stations and from
/// [`crate::services::relay_service::connect_local`] for in-process ones.
#[derive(Debug)]
pub struct StationLink {
    /// Messages published by the relay.
    pub inbound: mpsc::UnboundedReceiver<SyncMessage>,
    /// Messages for the relay to route. Dropping it disconnects the station.
    pub outbound: mpsc::UnboundedSender<SyncMessage>,
    /// Session changes of the underlying connection.
    pub status: watch::Receiver<LinkStatus>,
}

/// Resolve on the next switch to [`LinkStatus::Connected`]. Pends forever once the link
/// owner is gone.
pub(crate) async fn reconnected(status: &mut watch::Receiver<LinkStatus>) {
    loop {
        if status.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
        if *status.borrow_and_update() == LinkStatus::Connected {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use tokio::{
        sync::{mpsc, watch},
        time::timeout,
    };

    use super::{
        control::{ControlCommand, ControlNotice, ControlStation},
        view::{MatchOutcome, ViewCommand, ViewStation},
    };
    use crate::{
        config::AppConfig,
        dao::match_store::memory::MemoryMatchStore,
        services::relay_service::connect_local,
        state::{
            AppState,
            match_state::{BallColor, TableId, TeamSide},
            phase_machine::VisiblePhase,
        },
    };

    const WAIT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn control_and_view_play_a_match_through_the_relay() {
        let state = AppState::new(AppConfig::default());
        let store = MemoryMatchStore::new();
        state.install_match_store(Arc::new(store.clone())).await;
        let table = TableId::parse("1").unwrap();

        let control_link = connect_local(&state);
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (notice_tx, mut notice_rx) = mpsc::unbounded_channel();
        let control = ControlStation::from_config(&state.config(), control_link.outbound);
        tokio::spawn(control.run(
            control_link.inbound,
            control_link.status,
            control_rx,
            notice_tx,
        ));

        let view_link = connect_local(&state);
        let (view_tx, view_rx) = mpsc::unbounded_channel();
        let (warning_tx, _warning_rx) = mpsc::unbounded_channel();
        let view = ViewStation::new(60, 60, view_link.outbound);
        let (display_tx, mut display) = watch::channel(view.display());
        tokio::spawn(view.run(
            view_link.inbound,
            view_link.status,
            view_rx,
            display_tx,
            warning_tx,
        ));

        control_tx
            .send(ControlCommand::SelectTable(table.clone()))
            .unwrap();
        for (side, count) in [(TeamSide::Team1, 3), (TeamSide::Team2, 1)] {
            control_tx
                .send(ControlCommand::AdjustBalls {
                    side,
                    color: BallColor::Orange,
                    delta: count,
                })
                .unwrap();
        }

        view_tx.send(ViewCommand::SelectTable(table.clone())).unwrap();
        view_tx.send(ViewCommand::Advance).unwrap();
        timeout(WAIT, display.wait_for(|d| d.awaiting_start))
            .await
            .unwrap()
            .unwrap();

        control_tx.send(ControlCommand::Save).unwrap();
        let notice = timeout(WAIT, notice_rx.recv()).await.unwrap();
        assert_eq!(notice, Some(ControlNotice::Saved { table: table.clone() }));
        timeout(WAIT, display.wait_for(|d| d.saved))
            .await
            .unwrap()
            .unwrap();

        view_tx.send(ViewCommand::Advance).unwrap();
        view_tx.send(ViewCommand::Advance).unwrap();
        let winner = timeout(WAIT, display.wait_for(|d| d.phase == VisiblePhase::Winner))
            .await
            .unwrap()
            .unwrap()
            .clone();
        assert_eq!(winner.outcome, Some(MatchOutcome::Team1));
        let score = winner.score.unwrap();
        assert_eq!((score.team1_score, score.team2_score), (3, 1));

        let records = store.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].table_id, table);
        assert_eq!(records[0].team1.score, 3);
    }
}
