// viewer.rs
//
// The client half of the system: a viewer's current view of the published
// surveys, plus the device-local record of surveys already voted on. The
// record gates vote submission so a duplicate attempt never leaves the
// client; this is best-effort, per-device dedup, not a server-side identity.
use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::Survey;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt vote record: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Where the voted-survey list lives. Mirrors browser localStorage: load at
/// session start, save after every successful vote.
pub trait RecordStorage {
    fn load(&self) -> Result<Vec<Uuid>, RecordError>;
    fn save(&mut self, ids: &[Uuid]) -> Result<(), RecordError>;
}

#[derive(Default)]
pub struct MemoryRecordStorage {
    ids: Vec<Uuid>,
}

impl RecordStorage for MemoryRecordStorage {
    fn load(&self) -> Result<Vec<Uuid>, RecordError> {
        Ok(self.ids.clone())
    }

    fn save(&mut self, ids: &[Uuid]) -> Result<(), RecordError> {
        self.ids = ids.to_vec();
        Ok(())
    }
}

/// JSON file on disk; a missing file is an empty record.
pub struct FileRecordStorage {
    path: PathBuf,
}

impl FileRecordStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordStorage for FileRecordStorage {
    fn load(&self) -> Result<Vec<Uuid>, RecordError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, ids: &[Uuid]) -> Result<(), RecordError> {
        fs::write(&self.path, serde_json::to_string(ids)?)?;
        Ok(())
    }
}

/// Append-only set of survey ids this viewer has voted on.
pub struct VoteRecord<S: RecordStorage> {
    voted: Vec<Uuid>,
    storage: S,
}

impl<S: RecordStorage> VoteRecord<S> {
    pub fn load(storage: S) -> Result<Self, RecordError> {
        let voted = storage.load()?;
        Ok(Self { voted, storage })
    }

    pub fn contains(&self, survey_id: Uuid) -> bool {
        self.voted.contains(&survey_id)
    }

    pub fn insert(&mut self, survey_id: Uuid) -> Result<(), RecordError> {
        if !self.voted.contains(&survey_id) {
            self.voted.push(survey_id);
            self.storage.save(&self.voted)?;
        }
        Ok(())
    }
}

/// How the session reaches the vote endpoint. Production implementations
/// wrap an HTTP client; tests drive `submit_vote` directly.
#[async_trait]
pub trait VoteTransport {
    async fn submit(&self, survey_id: Uuid, option_id: Uuid) -> Result<Survey, TransportError>;
}

#[derive(Error, Debug)]
pub enum TransportError {
    /// The server refused the vote (not found / expired); the message is
    /// surfaced to the viewer verbatim.
    #[error("{0}")]
    Rejected(String),

    /// Network or server failure; the viewer may retry.
    #[error("Failed to submit vote.")]
    Unavailable,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("You have already voted on this survey.")]
    AlreadyVoted,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Record(#[from] RecordError),
}

/// One viewer's live view of the surveys.
///
/// The view has two sources of mutation, the listing fetch and the broadcast
/// subscription. Both merge by full-document replace keyed on survey id,
/// which is idempotent and commutative, so the two can interleave freely.
pub struct ViewerSession<S: RecordStorage> {
    surveys: Vec<Survey>,
    record: VoteRecord<S>,
}

impl<S: RecordStorage> ViewerSession<S> {
    pub fn new(record: VoteRecord<S>) -> Self {
        Self {
            surveys: Vec::new(),
            record,
        }
    }

    pub fn surveys(&self) -> &[Survey] {
        &self.surveys
    }

    /// Replace the whole view with a fresh listing fetch.
    pub fn load(&mut self, listing: Vec<Survey>) {
        self.surveys = listing;
    }

    /// Merge one broadcast update: replace the entry with the matching id,
    /// leave every other survey untouched. Updates for surveys not currently
    /// in view are dropped.
    pub fn apply_update(&mut self, updated: Survey) {
        if let Some(entry) = self.surveys.iter_mut().find(|s| s.id == updated.id) {
            *entry = updated;
        }
    }

    pub fn has_voted(&self, survey_id: Uuid) -> bool {
        self.record.contains(survey_id)
    }

    /// Attempt a vote. A survey already in the vote record is refused
    /// locally, before any network traffic. The record is only appended
    /// after the transport reports success, so a failed submission never
    /// marks the survey as voted.
    pub async fn vote<T: VoteTransport>(
        &mut self,
        transport: &T,
        survey_id: Uuid,
        option_id: Uuid,
    ) -> Result<(), SessionError> {
        if self.record.contains(survey_id) {
            return Err(SessionError::AlreadyVoted);
        }

        let updated = transport.submit(survey_id, option_id).await?;
        self.record.insert(survey_id)?;
        self.apply_update(updated);
        Ok(())
    }

    /// Percentage of total votes per option, in option order; all zeros when
    /// nobody has voted yet. `None` when the survey is not in view.
    pub fn percentages(&self, survey_id: Uuid) -> Option<Vec<f64>> {
        let survey = self.surveys.iter().find(|s| s.id == survey_id)?;
        let total = survey.total_votes();
        Some(
            survey
                .options
                .iter()
                .map(|o| {
                    if total == 0 {
                        0.0
                    } else {
                        o.votes as f64 / total as f64 * 100.0
                    }
                })
                .collect(),
        )
    }

    /// Tallies are hidden until this viewer has voted on the survey.
    pub fn shows_tallies(&self, survey_id: Uuid) -> bool {
        self.has_voted(survey_id)
    }
}
