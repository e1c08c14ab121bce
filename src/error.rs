// error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Error, Debug)]
pub enum VoteError {
    #[error("Survey or option not found")]
    NotFound,

    #[error("This survey has expired.")]
    Expired,

    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

impl IntoResponse for VoteError {
    fn into_response(self) -> Response {
        let (status, msg) = match &self {
            VoteError::NotFound => (StatusCode::NOT_FOUND, "Survey or option not found"),
            VoteError::Expired => (StatusCode::BAD_REQUEST, "This survey has expired."),
            VoteError::Persistence(e) => {
                error!("vote persistence failed: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server Error")
            }
        };

        (status, Json(json!({ "msg": msg }))).into_response()
    }
}
