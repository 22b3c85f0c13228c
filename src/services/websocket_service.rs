use std::ops::ControlFlow;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{dto::sync::SyncMessage, services::relay_service, state::SharedState};

/// Serve one station over `socket` until it closes.
///
/// The station is registered with the relay for the whole session; frames it sends are
/// routed like any other sync message.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sink, mut frames) = socket.split();
    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<Message>();

    // Relay publications and pongs share this writer so inbound handling never blocks on I/O.
    let writer = tokio::spawn(async move {
        while let Some(frame) = frame_rx.recv().await {
            if sink.send(frame).await.is_err() {
                break;
            }
        }
    });

    let station = state.relay().register(frame_tx.clone());
    info!(%station, "station connected");

    while let Some(frame) = frames.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(err) => {
                warn!(%station, error = %err, "station socket error");
                break;
            }
        };
        if on_frame(&state, station, &frame_tx, frame).await.is_break() {
            break;
        }
    }

    state.relay().unregister(&station);
    info!(%station, "station disconnected");
    finalize(writer, frame_tx).await;
}

async fn on_frame(
    state: &SharedState,
    station: Uuid,
    frame_tx: &mpsc::UnboundedSender<Message>,
    frame: Message,
) -> ControlFlow<()> {
    match frame {
        Message::Text(text) => match SyncMessage::from_json_str(text.as_str()) {
            Ok(message) => relay_service::handle_inbound(state, station, message).await,
            Err(err) => warn!(%station, error = %err, "dropping malformed sync message"),
        },
        Message::Ping(payload) => {
            let _ = frame_tx.send(Message::Pong(payload));
        }
        Message::Close(close) => {
            debug!(%station, "station sent close frame");
            let _ = frame_tx.send(Message::Close(close));
            return ControlFlow::Break(());
        }
        Message::Binary(_) | Message::Pong(_) => {}
    }
    ControlFlow::Continue(())
}

/// Let the writer flush queued frames, then wait for it to stop.
async fn finalize(writer: JoinHandle<()>, frame_tx: mpsc::UnboundedSender<Message>) {
    drop(frame_tx);
    let _ = writer.await;
}
