//! Routing of sync messages between stations and the persistence collaborator.

use axum::extract::ws::Message;
use tokio::{
    sync::{mpsc, watch},
    time::timeout,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::sync::{RequestScore, SaveRequest, SaveResult, SyncMessage},
    error::ServiceError,
    state::SharedState,
    stations::{LinkStatus, StationLink},
};

/// Handle one message received from station `from`.
///
/// Score updates are cached and fanned out, score requests are answered to the requester
/// only, and save requests are persisted in the background before their result is
/// broadcast.
pub async fn handle_inbound(state: &SharedState, from: Uuid, message: SyncMessage) {
    debug!(station = %from, kind = message.kind(), table = %message.table_id(), "relaying message");
    match message {
        SyncMessage::RequestScore(request) => answer_score_request(state, from, &request),
        SyncMessage::ScoreUpdate(update) => {
            state.relay().remember_score(&update);
            state.relay().publish(&SyncMessage::ScoreUpdate(update));
        }
        SyncMessage::SaveRequest(request) => {
            let state = state.clone();
            tokio::spawn(async move {
                let result = save_match(&state, request).await;
                state.relay().publish(&SyncMessage::SaveResult(result));
            });
        }
        SyncMessage::SaveResult(result) => {
            state.relay().publish(&SyncMessage::SaveResult(result));
        }
    }
}

fn answer_score_request(state: &SharedState, from: Uuid, request: &RequestScore) {
    match state.relay().cached_score(&request.table_id) {
        Some(update) => {
            state
                .relay()
                .send_to(&from, &SyncMessage::ScoreUpdate(update));
        }
        None => debug!(table = %request.table_id, "no score cached yet"),
    }
}

/// Persist `request` through the installed match store and build the acknowledgment.
///
/// The result echoes the request id so the control station can tell it apart from answers
/// to earlier saves of the same table.
pub async fn save_match(state: &SharedState, request: SaveRequest) -> SaveResult {
    let table = request.table_id.clone();
    let game_number = request.game_number.clone();
    let request_id = request.request_id;
    let result = match persist(state, request).await {
        Ok(()) => {
            info!(%table, game = %game_number, "match persisted");
            SaveResult::success(table, format!("game {game_number} saved"))
        }
        Err(err) => {
            warn!(%table, game = %game_number, error = %err, "failed to persist match");
            SaveResult::error(table, err.to_string())
        }
    };
    result.answering(request_id)
}

async fn persist(state: &SharedState, request: SaveRequest) -> Result<(), ServiceError> {
    let store = state.require_match_store().await?;
    // Blocking I/O already handed to the runtime is not cancelled by the timeout. Stores
    // publish a record in one final step (file rename, single PUT), so a record reported as
    // timed out may still appear; the station's retry then stores it under a new id.
    timeout(state.save_timeout(), store.save_match(request.into()))
        .await
        .map_err(|_| ServiceError::Timeout)??;
    Ok(())
}

/// Attach an in-process station to the relay.
///
/// The returned link behaves like a websocket connection: everything the relay publishes is
/// decoded onto `inbound`, and messages sent on `outbound` are routed as if they came from a
/// remote station. Dropping `outbound` disconnects the station. The link reports
/// [`LinkStatus::Connected`] for its whole life.
pub fn connect_local(state: &SharedState) -> StationLink {
    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<Message>();
    let id = state.relay().register(frame_tx);

    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(frame) = frame_rx.recv().await {
            let Message::Text(text) = frame else {
                continue;
            };
            match SyncMessage::from_json_str(text.as_str()) {
                Ok(message) => {
                    if inbound_tx.send(message).is_err() {
                        break;
                    }
                }
                Err(err) => warn!(station = %id, error = %err, "undecodable relay frame"),
            }
        }
    });

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
    let (status_tx, status_rx) = watch::channel(LinkStatus::Connected);
    let state = state.clone();
    tokio::spawn(async move {
        info!(station = %id, "local station connected");
        while let Some(message) = outbound_rx.recv().await {
            handle_inbound(&state, id, message).await;
        }
        state.relay().unregister(&id);
        status_tx.send_replace(LinkStatus::Connecting);
        info!(station = %id, "local station disconnected");
    });

    StationLink {
        inbound: inbound_rx,
        outbound: outbound_tx,
        status: status_rx,
    }
}
