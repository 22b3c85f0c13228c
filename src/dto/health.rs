use serde::Serialize;
use utoipa::ToSchema;

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// "ok", or "degraded" when saves cannot currently be persisted.
    pub status: String,
    /// Number of stations connected to the relay.
    pub stations: usize,
}

impl HealthResponse {
    /// The match store answered its health check.
    pub fn ok(stations: usize) -> Self {
        Self {
            status: "ok".to_string(),
            stations,
        }
    }

    /// No match store, or the store is unreachable.
    pub fn degraded(stations: usize) -> Self {
        Self {
            status: "degraded".to_string(),
            stations,
        }
    }
}
