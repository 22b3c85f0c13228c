//! Tennis relay binary entrypoint wiring REST, WebSocket, SSE and match persistence.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use tennis_relay::{
    config::AppConfig,
    init_tracing,
    dao::match_store::{MatchStore, file::FileMatchStore, memory::MemoryMatchStore},
    routes,
    state::{AppState, SharedState},
};

const DEFAULT_PORT: u16 = 5000;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("info,tower_http=debug");

    let config = AppConfig::load();
    let app_state = AppState::new(config);
    app_state.install_match_store(open_match_store(&app_state).await).await;

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting relay");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Pick the persistence backend: CouchDB when `COUCH_BASE_URL` is set, the scores directory
/// otherwise, and memory as a last resort so the relay keeps serving.
async fn open_match_store(state: &SharedState) -> Arc<dyn MatchStore> {
    #[cfg(feature = "couch-store")]
    {
        if env::var_os("COUCH_BASE_URL").is_some() {
            use tennis_relay::dao::match_store::couchdb::{CouchConfig, CouchMatchStore};

            match CouchConfig::from_env() {
                Ok(couch) => match CouchMatchStore::connect(couch).await {
                    Ok(store) => {
                        info!("persisting matches to CouchDB");
                        return Arc::new(store);
                    }
                    Err(err) => warn!(error = %err, "CouchDB unreachable; using the scores directory"),
                },
                Err(err) => warn!(error = %err, "invalid CouchDB configuration"),
            }
        }
    }

    let config = state.config();
    match FileMatchStore::open(config.scores_dir()).await {
        Ok(store) => {
            info!(dir = %store.dir().display(), "persisting matches to disk");
            Arc::new(store)
        }
        Err(err) => {
            warn!(error = %err, "scores directory unusable; saved matches are kept in memory only");
            Arc::new(MemoryMatchStore::new())
        }
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "SIGTERM handler unavailable; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("shutting down");
}
