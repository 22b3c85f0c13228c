//! Shared relay state and the match domain: scoring, phases and countdowns.

pub mod match_state;
pub mod penalty;
/// Match phase transitions driven by the view station.
pub mod phase_machine;
pub mod relay;
pub mod scoring;
mod sse;
pub mod timer;

use std::{sync::Arc, time::Duration};

use tokio::sync::RwLock;

use crate::{
    config::AppConfig, dao::match_store::MatchStore, error::ServiceError,
    state::penalty::PenaltyCatalog,
};

pub use self::relay::{Relay, StationConnection};
pub use self::sse::{SseHub, TableStreams};

/// Handle on the relay state shared by handlers and background tasks.
pub type SharedState = Arc<AppState>;
/// Capacity of each per-table SSE broadcast channel.
pub const DEFAULT_SSE_CAPACITY: usize = 16;

/// Central relay state: configuration, connected stations and the persistence collaborator.
pub struct AppState {
    config: Arc<AppConfig>,
    match_store: RwLock<Option<Arc<dyn MatchStore>>>,
    relay: Relay,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// No match store is installed yet; saves are answered with an error until one is.
    pub fn new(config: AppConfig) -> SharedState {
        let relay = Relay::new(DEFAULT_SSE_CAPACITY, config.max_tables());
        Arc::new(Self {
            config: Arc::new(config),
            match_store: RwLock::new(None),
            relay,
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> Arc<AppConfig> {
        self.config.clone()
    }

    /// The catalog every consumer validates and scores against.
    pub fn catalog(&self) -> &PenaltyCatalog {
        self.config.penalties()
    }

    /// Upper bound on a single persistence call.
    pub fn save_timeout(&self) -> Duration {
        self.config.save_timeout()
    }

    /// Station registry and score cache.
    pub fn relay(&self) -> &Relay {
        &self.relay
    }

    /// Obtain a handle to the current match store, if one is installed.
    pub async fn match_store(&self) -> Option<Arc<dyn MatchStore>> {
        let guard = self.match_store.read().await;
        guard.as_ref().cloned()
    }

    /// Like [`AppState::match_store`] but failing when no store is installed.
    pub async fn require_match_store(&self) -> Result<Arc<dyn MatchStore>, ServiceError> {
        self.match_store().await.ok_or(ServiceError::NoMatchStore)
    }

    /// Install a new match store implementation.
    pub async fn install_match_store(&self, store: Arc<dyn MatchStore>) {
        let mut guard = self.match_store.write().await;
        *guard = Some(store);
    }
}
