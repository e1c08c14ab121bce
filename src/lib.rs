//! Timed multiple-choice surveys with live tallies.
//!
//! Anonymous viewers cast one vote per survey; successful votes are fanned
//! out to every connected viewer over a broadcast channel so tallies stay
//! consistent without any shared client session. Survey authoring and admin
//! auth live elsewhere; this crate owns the vote transaction, the tally
//! store contract, the live channel, and the viewer-session logic.
use std::sync::Arc;
use std::time::Duration;

use http::{header::CONTENT_TYPE, Method};
use tokio::net::TcpListener;
use tokio::signal::{
    ctrl_c,
    unix::{signal, SignalKind},
};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub mod broadcast;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod store;
pub mod viewer;
pub mod vote;

use broadcast::Broadcaster;
use config::Config;
use db::PgStore;
use routes::{create_routes, AppState};
use store::{MemoryStore, TallyStore};

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = Config::load();

    let store: Arc<dyn TallyStore> = match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url)
                .await
                .expect("Failed to connect to the database");
            Arc::new(PgStore::new(pool))
        }
        None => {
            info!("DATABASE_URL not set, running with in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let broadcaster = config
        .live_updates
        .then(|| Broadcaster::new(config.broadcast_capacity));
    if broadcaster.is_none() {
        info!("live updates disabled, viewers fall back to re-fetching");
    }

    let state = Arc::new(AppState { store, broadcaster });

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let app = create_routes(state).layer(cors);

    let address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&address)
        .await
        .expect("Failed to bind address");
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
