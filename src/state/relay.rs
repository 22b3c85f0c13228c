//! Connection registry and per-table score cache of the sync relay.

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    dto::{
        sse::ServerEvent,
        sync::{ScoreUpdate, SyncMessage},
    },
    state::{match_state::TableId, sse::TableStreams},
};

#[derive(Clone)]
/// Handle used to push frames to a connected station.
pub struct StationConnection {
    /// Registry key of the station.
    pub id: Uuid,
    /// Writer queue of the station's socket.
    pub tx: mpsc::UnboundedSender<Message>,
}

/// Fan-out point between stations.
///
/// Every published message reaches every connected station; stations filter by table id
/// themselves. The latest `ScoreUpdate` of each table is cached to answer `RequestScore`,
/// for at most `max_tables` tables.
pub struct Relay {
    connections: DashMap<Uuid, StationConnection>,
    scores: DashMap<TableId, ScoreUpdate>,
    max_tables: usize,
    streams: TableStreams,
}

impl Relay {
    /// Create an empty relay whose table SSE hubs buffer `sse_capacity` events.
    pub fn new(sse_capacity: usize, max_tables: usize) -> Self {
        Self {
            connections: DashMap::new(),
            scores: DashMap::new(),
            max_tables,
            streams: TableStreams::new(sse_capacity, max_tables),
        }
    }

    /// Register a station writer and return its connection id.
    pub fn register(&self, tx: mpsc::UnboundedSender<Message>) -> Uuid {
        let id = Uuid::new_v4();
        self.connections.insert(id, StationConnection { id, tx });
        id
    }

    /// Forget a station; returns whether it was registered.
    pub fn unregister(&self, id: &Uuid) -> bool {
        self.connections.remove(id).is_some()
    }

    /// Number of stations currently connected.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Replace the cached score of the update's table.
    ///
    /// Returns `false` when the table is new and the cache is full; the update is still
    /// relayed, it just cannot be pulled later.
    pub fn remember_score(&self, update: &ScoreUpdate) -> bool {
        if let Some(mut cached) = self.scores.get_mut(&update.table_id) {
            *cached = update.clone();
            return true;
        }
        if self.scores.len() >= self.max_tables {
            warn!(table = %update.table_id, limit = self.max_tables, "score cache full; not caching table");
            return false;
        }
        self.scores.insert(update.table_id.clone(), update.clone());
        true
    }

    /// Latest score seen for `table`.
    pub fn cached_score(&self, table: &TableId) -> Option<ScoreUpdate> {
        self.scores.get(table).map(|entry| entry.value().clone())
    }

    /// Per-table SSE hubs.
    pub fn streams(&self) -> &TableStreams {
        &self.streams
    }

    /// Deliver `message` to every connected station and to the table's SSE subscribers.
    ///
    /// Returns the number of stations the frame was queued for. Stations whose writer is
    /// gone are dropped from the registry.
    pub fn publish(&self, message: &SyncMessage) -> usize {
        let Some(payload) = encode(message) else {
            return 0;
        };

        let mut delivered = 0;
        let mut closed = Vec::new();
        for connection in self.connections.iter() {
            if connection.tx.send(Message::Text(payload.clone().into())).is_ok() {
                delivered += 1;
            } else {
                closed.push(connection.id);
            }
        }
        for id in closed {
            debug!(%id, "dropping closed station connection");
            self.connections.remove(&id);
        }

        if matches!(
            message,
            SyncMessage::ScoreUpdate(_) | SyncMessage::SaveResult(_)
        ) {
            self.streams.broadcast(
                message.table_id(),
                ServerEvent::new(Some(message.kind().to_string()), payload),
            );
        }

        delivered
    }

    /// Deliver `message` to a single station. Returns `false` when it is not connected.
    pub fn send_to(&self, id: &Uuid, message: &SyncMessage) -> bool {
        let Some(tx) = self.connections.get(id).map(|entry| entry.tx.clone()) else {
            return false;
        };
        let Some(payload) = encode(message) else {
            return false;
        };
        if tx.send(Message::Text(payload.into())).is_err() {
            self.connections.remove(id);
            return false;
        }
        true
    }
}

fn encode(message: &SyncMessage) -> Option<String> {
    match serde_json::to_string(message) {
        Ok(payload) => Some(payload),
        Err(err) => {
            warn!(kind = message.kind(), error = %err, "failed to serialize sync message");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(table: &str, score: u32) -> ScoreUpdate {
        ScoreUpdate {
            table_id: TableId::parse(table).unwrap(),
            team1_name: "Lions".into(),
            team2_name: "Owls".into(),
            team1_score: score,
            team2_score: 0,
            saved: false,
        }
    }

    fn text(message: Message) -> SyncMessage {
        match message {
            Message::Text(text) => SyncMessage::from_json_str(text.as_str()).unwrap(),
            other => panic!("unexpected frame {other:?}"),
        }
    }

    #[tokio::test]
    async fn publish_reaches_every_station_and_prunes_closed_ones() {
        let relay = Relay::new(4, 8);
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, rx_b) = mpsc::unbounded_channel();
        relay.register(tx_a);
        relay.register(tx_b);
        drop(rx_b);

        let message = SyncMessage::ScoreUpdate(update("1", 4));
        assert_eq!(relay.publish(&message), 1);
        assert_eq!(relay.connection_count(), 1);
        assert_eq!(text(rx_a.recv().await.unwrap()), message);
    }

    #[tokio::test]
    async fn send_to_targets_a_single_station() {
        let relay = Relay::new(4, 8);
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let a = relay.register(tx_a);
        relay.register(tx_b);

        let message = SyncMessage::ScoreUpdate(update("2", 1));
        assert!(relay.send_to(&a, &message));
        assert_eq!(text(rx_a.recv().await.unwrap()), message);
        assert!(rx_b.try_recv().is_err());

        assert!(relay.unregister(&a));
        assert!(!relay.send_to(&a, &message));
    }

    #[tokio::test]
    async fn score_updates_are_cached_and_streamed_per_table() {
        let relay = Relay::new(4, 8);
        let table = TableId::parse("3").unwrap();
        let mut stream = relay.streams().subscribe(&table).unwrap();

        assert!(relay.remember_score(&update("3", 1)));
        assert!(relay.remember_score(&update("3", 6)));
        assert_eq!(relay.cached_score(&table).map(|u| u.team1_score), Some(6));
        assert!(relay.cached_score(&TableId::parse("4").unwrap()).is_none());

        relay.publish(&SyncMessage::ScoreUpdate(update("3", 6)));
        let event = stream.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some("scoreUpdate"));
        assert!(event.data.contains("\"team1Score\":6"));
    }

    #[test]
    fn score_cache_is_bounded() {
        let relay = Relay::new(4, 2);
        assert!(relay.remember_score(&update("1", 1)));
        assert!(relay.remember_score(&update("2", 1)));
        assert!(!relay.remember_score(&update("3", 1)));
        assert!(relay.cached_score(&TableId::parse("3").unwrap()).is_none());

        assert!(relay.remember_score(&update("2", 9)));
        assert_eq!(
            relay.cached_score(&TableId::parse("2").unwrap()).map(|u| u.team1_score),
            Some(9)
        );
    }
}
