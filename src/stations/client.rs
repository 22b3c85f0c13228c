//! Websocket link from a station process to the relay's `/ws` endpoint, reconnecting until
//! the station goes away.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::{
    net::TcpStream,
    sync::{mpsc, watch},
    time::sleep,
};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use super::{LinkStatus, StationLink};
use crate::dto::sync::SyncMessage;

type RelaySocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    /// The relay went away; try again after the retry delay.
    Lost,
    /// The station dropped its end of the link.
    StationGone,
}

/// Connect to the relay at `url` (e.g. `ws://127.0.0.1:5000/ws`) in the background.
///
/// The returned link is usable immediately: outbound messages are queued until a session is
/// up, and `status` reports every (re)connection so the station can resynchronize.
pub fn connect(url: impl Into<String>, retry: Duration) -> StationLink {
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (status_tx, status_rx) = watch::channel(LinkStatus::Connecting);
    tokio::spawn(maintain(url.into(), retry, inbound_tx, outbound_rx, status_tx));

    StationLink {
        inbound: inbound_rx,
        outbound: outbound_tx,
        status: status_rx,
    }
}

async fn maintain(
    url: String,
    retry: Duration,
    inbound: mpsc::UnboundedSender<SyncMessage>,
    mut outbound: mpsc::UnboundedReceiver<SyncMessage>,
    status: watch::Sender<LinkStatus>,
) {
    loop {
        match connect_async(url.as_str()).await {
            Ok((socket, _response)) => {
                info!(%url, "connected to relay");
                status.send_replace(LinkStatus::Connected);
                let end = session(socket, &inbound, &mut outbound).await;
                status.send_replace(LinkStatus::Connecting);
                if end == SessionEnd::StationGone {
                    break;
                }
                warn!(%url, "relay connection lost");
            }
            Err(err) => warn!(%url, error = %err, "relay unreachable"),
        }

        tokio::select! {
            _ = sleep(retry) => {}
            _ = inbound.closed() => break,
        }
    }
    debug!(%url, "station link closed");
}

/// Pump one websocket session until either side goes away.
async fn session(
    socket: RelaySocket,
    inbound: &mpsc::UnboundedSender<SyncMessage>,
    outbound: &mut mpsc::UnboundedReceiver<SyncMessage>,
) -> SessionEnd {
    let (mut sink, mut frames) = socket.split();
    loop {
        tokio::select! {
            message = outbound.recv() => {
                let Some(message) = message else {
                    let _ = sink.send(Message::Close(None)).await;
                    return SessionEnd::StationGone;
                };
                let payload = match serde_json::to_string(&message) {
                    Ok(payload) => payload,
                    Err(err) => {
                        warn!(kind = message.kind(), error = %err, "failed to serialize sync message");
                        continue;
                    }
                };
                if let Err(err) = sink.send(Message::Text(payload.into())).await {
                    warn!(kind = message.kind(), error = %err, "failed to send to relay");
                    return SessionEnd::Lost;
                }
            }
            frame = frames.next() => match frame {
                Some(Ok(Message::Text(text))) => match SyncMessage::from_json_str(text.as_str()) {
                    Ok(message) => {
                        if inbound.send(message).is_err() {
                            return SessionEnd::StationGone;
                        }
                    }
                    Err(err) => warn!(error = %err, "dropping malformed relay frame"),
                },
                Some(Ok(Message::Close(_))) | None => return SessionEnd::Lost,
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    warn!(error = %err, "relay socket error");
                    return SessionEnd::Lost;
                }
            },
        }
    }
}
