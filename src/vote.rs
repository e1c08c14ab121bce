// src/vote.rs
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::broadcast::Broadcaster;
use crate::error::VoteError;
use crate::models::Survey;
use crate::store::TallyStore;

/// Record one vote for `(survey_id, option_id)`.
///
/// The survey/option pair is resolved in a single compound-key lookup to
/// check expiry, then the increment is applied through the store's atomic
/// find-and-mutate, which adds exactly 1 however many votes race on the same
/// option. The broadcast only happens after the increment is durable, and a
/// broadcast failure never affects the voter's result.
pub async fn submit_vote(
    store: &dyn TallyStore,
    broadcaster: Option<&Broadcaster>,
    survey_id: Uuid,
    option_id: Uuid,
) -> Result<Survey, VoteError> {
    let Some(survey) = store.find_matching(survey_id, option_id).await? else {
        return Err(VoteError::NotFound);
    };

    if survey.is_expired(Utc::now()) {
        return Err(VoteError::Expired);
    }

    let Some(survey) = store.record_vote(survey_id, option_id).await? else {
        return Err(VoteError::NotFound);
    };
    info!(survey = %survey_id, option = %option_id, "vote recorded");

    if let Some(broadcaster) = broadcaster {
        broadcaster.publish(&survey);
    }

    Ok(survey)
}
