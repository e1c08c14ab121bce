// store.rs
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::Survey;

/// Persistence contract for survey tallies.
///
/// The increment is the store's atomic primitive: `record_vote` resolves the
/// compound key and applies the +1 in one operation, so concurrent votes,
/// same option or not, never read-then-write each other's update away. No
/// in-process lock outside the store coordinates votes.
#[async_trait]
pub trait TallyStore: Send + Sync {
    /// Single-step compound-key lookup: the survey with this id that also
    /// contains an option with this id, or `None`.
    async fn find_matching(
        &self,
        survey_id: Uuid,
        option_id: Uuid,
    ) -> Result<Option<Survey>, StoreError>;

    /// Atomically add one vote to the matched option and return the updated
    /// document; `None` when the compound key does not resolve.
    async fn record_vote(
        &self,
        survey_id: Uuid,
        option_id: Uuid,
    ) -> Result<Option<Survey>, StoreError>;

    /// Every survey eligible for display. Expired surveys are included;
    /// expiry is enforced at vote time, not at listing time.
    async fn list_public(&self) -> Result<Vec<Survey>, StoreError>;
}

/// In-memory store, used in tests and in deployments without a database.
#[derive(Clone, Default)]
pub struct MemoryStore {
    surveys: Arc<RwLock<HashMap<Uuid, Survey>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeding hook for the (out-of-scope) admin authoring side and tests.
    pub async fn insert(&self, survey: Survey) {
        self.surveys.write().await.insert(survey.id, survey);
    }
}

#[async_trait]
impl TallyStore for MemoryStore {
    async fn find_matching(
        &self,
        survey_id: Uuid,
        option_id: Uuid,
    ) -> Result<Option<Survey>, StoreError> {
        let surveys = self.surveys.read().await;
        Ok(surveys
            .get(&survey_id)
            .filter(|s| s.has_option(option_id))
            .cloned())
    }

    async fn record_vote(
        &self,
        survey_id: Uuid,
        option_id: Uuid,
    ) -> Result<Option<Survey>, StoreError> {
        // one write-lock acquisition spans the lookup and the increment
        let mut surveys = self.surveys.write().await;
        let Some(survey) = surveys.get_mut(&survey_id) else {
            return Ok(None);
        };
        let Some(option) = survey.option_mut(option_id) else {
            return Ok(None);
        };
        option.votes += 1;
        Ok(Some(survey.clone()))
    }

    async fn list_public(&self) -> Result<Vec<Survey>, StoreError> {
        let surveys = self.surveys.read().await;
        let mut all: Vec<Survey> = surveys.values().cloned().collect();
        all.sort_by_key(|s| s.id);
        Ok(all)
    }
}
