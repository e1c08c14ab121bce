// handlers.rs
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;
use uuid::Uuid;

use crate::error::VoteError;
use crate::models::Survey;
use crate::routes::AppState;
use crate::vote::submit_vote;

/// Public survey listing. Expired surveys are included; they are only
/// rejected at vote time.
pub async fn list_surveys(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Survey>>, VoteError> {
    let surveys = state.store.list_public().await?;
    Ok(Json(surveys))
}

/// Cast one vote. Path ids are opaque strings; anything that is not a known
/// survey/option pair resolves to 404.
pub async fn vote(
    State(state): State<Arc<AppState>>,
    Path((survey_id, option_id)): Path<(String, String)>,
) -> Result<Json<Survey>, VoteError> {
    let survey_id = Uuid::parse_str(&survey_id).map_err(|_| VoteError::NotFound)?;
    let option_id = Uuid::parse_str(&option_id).map_err(|_| VoteError::NotFound)?;

    let survey = submit_vote(
        state.store.as_ref(),
        state.broadcaster.as_ref(),
        survey_id,
        option_id,
    )
    .await?;

    Ok(Json(survey))
}

/// Live tally feed. Each vote update is delivered as one JSON text frame to
/// every connected viewer; clients filter by survey id themselves.
pub async fn live_updates(
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> Response {
    let Some(broadcaster) = &state.broadcaster else {
        // hosting mode without long-lived connections; viewers re-fetch
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    };

    let updates = broadcaster.subscribe();
    ws.on_upgrade(move |socket| stream_updates(socket, updates))
}

async fn stream_updates(mut socket: WebSocket, mut updates: broadcast::Receiver<Survey>) {
    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(survey) => {
                    let Ok(payload) = serde_json::to_string(&survey) else {
                        continue;
                    };
                    if socket.send(Message::Text(payload.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "viewer lagged behind vote updates");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                // viewers send nothing we act on; any frame keeps the
                // connection alive, absence or error means disconnect
                Some(Ok(_)) => {}
                _ => break,
            },
        }
    }
}
