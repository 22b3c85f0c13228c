//! Server-sent event hubs keyed by table.

use dashmap::{DashMap, mapref::entry::Entry};
use tokio::sync::broadcast;
use tracing::debug;

use crate::{dto::sse::ServerEvent, state::match_state::TableId};

/// Per-table SSE fan-out. Hubs are created on first subscription, at most `max_tables` of
/// them, and dropped again with their last subscriber.
pub struct TableStreams {
    capacity: usize,
    max_tables: usize,
    hubs: DashMap<TableId, SseHub>,
}

impl TableStreams {
    /// Build the registry; each hub gets a broadcast channel of `capacity`.
    pub fn new(capacity: usize, max_tables: usize) -> Self {
        Self {
            capacity,
            max_tables,
            hubs: DashMap::new(),
        }
    }

    /// Subscribe to the events of `table`.
    ///
    /// Returns `None` when a new hub would exceed the table limit.
    pub fn subscribe(&self, table: &TableId) -> Option<broadcast::Receiver<ServerEvent>> {
        if !self.hubs.contains_key(table) && self.hubs.len() >= self.max_tables {
            return None;
        }
        match self.hubs.entry(table.clone()) {
            Entry::Occupied(hub) => Some(hub.get().subscribe()),
            Entry::Vacant(slot) => Some(slot.insert(SseHub::new(self.capacity)).subscribe()),
        }
    }

    /// Drop the hub of `table` once nobody listens anymore. Call after dropping a receiver.
    pub fn release(&self, table: &TableId) {
        if self
            .hubs
            .remove_if(table, |_, hub| hub.subscriber_count() == 0)
            .is_some()
        {
            debug!(%table, "closed idle table stream");
        }
    }

    /// Number of tables with a live hub.
    pub fn len(&self) -> usize {
        self.hubs.len()
    }

    /// Whether no table has a live hub.
    pub fn is_empty(&self) -> bool {
        self.hubs.is_empty()
    }

    /// Forward `event` to the subscribers of `table`, if any.
    pub fn broadcast(&self, table: &TableId, event: ServerEvent) {
        if let Some(hub) = self.hubs.get(table) {
            hub.broadcast(event);
        }
    }
}

/// Simple broadcast hub wrapper used by the SSE services.
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Receivers still alive.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(id: &str) -> TableId {
        TableId::parse(id).unwrap()
    }

    #[tokio::test]
    async fn events_only_reach_their_table() {
        let streams = TableStreams::new(4, 8);
        let mut rx_one = streams.subscribe(&table("1")).unwrap();
        let mut rx_two = streams.subscribe(&table("2")).unwrap();

        streams.broadcast(&table("1"), ServerEvent::new(Some("scoreUpdate".into()), "{}".into()));

        let event = rx_one.recv().await.unwrap();
        assert_eq!(event.event.as_deref(), Some("scoreUpdate"));
        assert!(rx_two.try_recv().is_err());
    }

    #[test]
    fn hubs_go_away_with_their_last_subscriber() {
        let streams = TableStreams::new(4, 8);
        let first = streams.subscribe(&table("1")).unwrap();
        let second = streams.subscribe(&table("1")).unwrap();
        assert_eq!(streams.len(), 1);

        drop(first);
        streams.release(&table("1"));
        assert_eq!(streams.len(), 1);

        drop(second);
        streams.release(&table("1"));
        assert!(streams.is_empty());

        // Broadcasting to a table nobody follows does not create a hub.
        streams.broadcast(&table("1"), ServerEvent::new(None, "{}".into()));
        assert!(streams.is_empty());
    }

    #[test]
    fn new_tables_are_refused_at_the_limit() {
        let streams = TableStreams::new(4, 2);
        let _one = streams.subscribe(&table("1")).unwrap();
        let _two = streams.subscribe(&table("2")).unwrap();

        assert!(streams.subscribe(&table("3")).is_none());
        assert!(streams.subscribe(&table("2")).is_some());
    }
}
