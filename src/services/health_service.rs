use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report `ok` while the match store answers its health check, `degraded` otherwise.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let stations = state.relay().connection_count();
    let store = match state.require_match_store().await {
        Ok(store) => store,
        Err(_) => {
            warn!("no match store installed (degraded mode)");
            return HealthResponse::degraded(stations);
        }
    };

    match store.health_check().await {
        Ok(()) => HealthResponse::ok(stations),
        Err(err) => {
            warn!(error = %err, "storage health check failed");
            HealthResponse::degraded(stations)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::match_store::{file::FileMatchStore, memory::MemoryMatchStore},
        state::AppState,
    };

    #[tokio::test]
    async fn degraded_without_store() {
        let state = AppState::new(AppConfig::default());
        assert_eq!(health_status(&state).await.status, "degraded");

        state
            .install_match_store(Arc::new(MemoryMatchStore::new()))
            .await;
        assert_eq!(health_status(&state).await.status, "ok");
    }

    #[tokio::test]
    async fn degraded_when_scores_dir_disappears() {
        let dir = tempfile::tempdir().unwrap();
        let scores = dir.path().join("scores");
        let state = AppState::new(AppConfig::default());
        state
            .install_match_store(Arc::new(FileMatchStore::open(&scores).await.unwrap()))
            .await;
        assert_eq!(health_status(&state).await.status, "ok");

        std::fs::remove_dir_all(&scores).unwrap();
        assert_eq!(health_status(&state).await.status, "degraded");
    }
}
