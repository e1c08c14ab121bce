// routes.rs
use std::sync::Arc;

use axum::{
    routing::{get, put},
    Router,
};

use crate::broadcast::Broadcaster;
use crate::handlers;
use crate::store::TallyStore;

pub struct AppState {
    pub store: Arc<dyn TallyStore>,
    /// Absent in hosting modes that cannot hold long-lived connections.
    pub broadcaster: Option<Broadcaster>,
}

pub fn create_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/surveys/public", get(handlers::list_surveys))
        .route(
            "/api/surveys/vote/{survey_id}/{option_id}",
            put(handlers::vote),
        )
        .route("/api/surveys/live", get(handlers::live_updates))
        .with_state(state)
}
