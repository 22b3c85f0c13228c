use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

use crate::{
    dto::{
        sse::{Handshake, ServerEvent},
        sync::SyncMessage,
    },
    error::ServiceError,
    state::{SharedState, match_state::TableId},
};

/// Subscribe to the events of one table, returning the receiver and the events a new
/// subscriber should see first (handshake, then the cached score if any).
pub fn subscribe_table(
    state: &SharedState,
    table: &TableId,
) -> Result<(broadcast::Receiver<ServerEvent>, Vec<ServerEvent>), ServiceError> {
    let receiver = state
        .relay()
        .streams()
        .subscribe(table)
        .ok_or_else(|| ServiceError::TooManyTables(state.config().max_tables()))?;

    let mut initial = Vec::with_capacity(2);
    match ServerEvent::json(
        Some("handshake".to_string()),
        &Handshake {
            table_id: table.clone(),
            message: format!("subscribed to table {table}"),
        },
    ) {
        Ok(event) => initial.push(event),
        Err(err) => warn!(error = %err, "failed to serialize SSE handshake"),
    }

    if let Some(update) = state.relay().cached_score(table) {
        let message = SyncMessage::ScoreUpdate(update);
        match ServerEvent::json(Some(message.kind().to_string()), &message) {
            Ok(event) => initial.push(event),
            Err(err) => warn!(error = %err, "failed to serialize cached score"),
        }
    }

    Ok((receiver, initial))
}

/// Convert a broadcast receiver into an SSE response, forwarding events and
/// cleaning up once the client disconnects.
pub fn to_sse_stream(
    state: SharedState,
    receiver: broadcast::Receiver<ServerEvent>,
    initial: Vec<ServerEvent>,
    table: TableId,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    // forwarder task: replays the initial events, then reads from broadcast
    tokio::spawn(async move {
        forward(receiver, initial, &tx, &table).await;
        state.relay().streams().release(&table);
        info!(%table, "table SSE stream disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Pump events until the client or the hub goes away. Consumes the receiver so the hub
/// can be released afterwards.
async fn forward(
    mut receiver: broadcast::Receiver<ServerEvent>,
    initial: Vec<ServerEvent>,
    tx: &mpsc::Sender<Result<Event, Infallible>>,
    table: &TableId,
) {
    for payload in initial {
        if tx.send(Ok(to_event(payload))).await.is_err() {
            return;
        }
    }

    loop {
        tokio::select! {
            _ = tx.closed() => break,
            recv_result = receiver.recv() => {
                match recv_result {
                    Ok(payload) => {
                        if tx.send(Ok(to_event(payload))).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Closed) => break,
                    Err(RecvError::Lagged(skipped)) => {
                        // Score updates are idempotent; the next one catches up.
                        warn!(%table, skipped, "SSE subscriber lagging");
                        continue;
                    }
                }
            }
        }
    }
}

fn to_event(payload: ServerEvent) -> Event {
    let event = Event::default().data(payload.data);
    match payload.event {
        Some(name) => event.event(name),
        None => event,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, dto::sync::ScoreUpdate, state::AppState};

    fn limited_state(max_tables: usize) -> (tempfile::TempDir, SharedState) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.json");
        std::fs::write(&path, format!(r#"{{ "max_tables": {max_tables} }}"#)).unwrap();
        (dir, AppState::new(AppConfig::load_from(&path)))
    }

    #[test]
    fn new_subscribers_get_handshake_then_cached_score() {
        let state = AppState::new(AppConfig::default());
        let table = TableId::parse("1").unwrap();

        let (_rx, initial) = subscribe_table(&state, &table).unwrap();
        assert_eq!(initial.len(), 1);
        assert_eq!(initial[0].event.as_deref(), Some("handshake"));
        assert!(initial[0].data.contains("\"tableId\":\"1\""));

        state.relay().remember_score(&ScoreUpdate {
            table_id: table.clone(),
            team1_name: "A".into(),
            team2_name: "B".into(),
            team1_score: 3,
            team2_score: 1,
            saved: true,
        });
        let (_rx, initial) = subscribe_table(&state, &table).unwrap();
        assert_eq!(initial.len(), 2);
        assert_eq!(initial[1].event.as_deref(), Some("scoreUpdate"));
        assert!(initial[1].data.contains("\"saved\":true"));
    }

    #[tokio::test]
    async fn closed_streams_release_their_table() {
        let state = AppState::new(AppConfig::default());
        let table = TableId::parse("5").unwrap();
        let (receiver, initial) = subscribe_table(&state, &table).unwrap();
        assert_eq!(state.relay().streams().len(), 1);

        let response = to_sse_stream(state.clone(), receiver, initial, table);
        drop(response);

        tokio::time::timeout(Duration::from_secs(5), async {
            while !state.relay().streams().is_empty() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }

    #[test]
    fn subscriptions_beyond_the_table_limit_are_refused() {
        let (_dir, state) = limited_state(1);
        let one = TableId::parse("1").unwrap();
        let (_rx, _) = subscribe_table(&state, &one).unwrap();

        assert!(matches!(
            subscribe_table(&state, &TableId::parse("2").unwrap()),
            Err(ServiceError::TooManyTables(1))
        ));
        assert!(subscribe_table(&state, &one).is_ok());
    }
}
