// End-to-end vote flow over the in-memory store: two viewers, one survey,
// live updates merged into each viewer's view.
use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use survey_backend::broadcast::Broadcaster;
use survey_backend::error::VoteError;
use survey_backend::models::{Survey, SurveyOption};
use survey_backend::store::{MemoryStore, TallyStore};
use survey_backend::viewer::{
    MemoryRecordStorage, SessionError, TransportError, ViewerSession, VoteRecord, VoteTransport,
};
use survey_backend::vote::submit_vote;

/// Drives the vote transaction directly, standing in for the HTTP client
/// and mapping server failures the way the client taxonomy does.
struct LocalTransport {
    store: MemoryStore,
    broadcaster: Option<Broadcaster>,
}

#[async_trait]
impl VoteTransport for LocalTransport {
    async fn submit(&self, survey_id: Uuid, option_id: Uuid) -> Result<Survey, TransportError> {
        submit_vote(
            &self.store,
            self.broadcaster.as_ref(),
            survey_id,
            option_id,
        )
        .await
        .map_err(|e| match e {
            VoteError::NotFound | VoteError::Expired => TransportError::Rejected(e.to_string()),
            VoteError::Persistence(_) => TransportError::Unavailable,
        })
    }
}

fn session() -> ViewerSession<MemoryRecordStorage> {
    ViewerSession::new(VoteRecord::load(MemoryRecordStorage::default()).unwrap())
}

fn survey(title: &str, options: &[&str], expires_in: Duration) -> Survey {
    Survey {
        id: Uuid::new_v4(),
        title: title.to_string(),
        options: options
            .iter()
            .map(|&text| SurveyOption {
                id: Uuid::new_v4(),
                text: text.to_string(),
                votes: 0,
            })
            .collect(),
        expires_at: Utc::now() + expires_in,
    }
}

#[tokio::test]
async fn two_viewers_converge_on_the_same_tallies() {
    let store = MemoryStore::new();
    let broadcaster = Broadcaster::default();
    let mut updates = broadcaster.subscribe();

    let s = survey("Team lunch", &["A", "B"], Duration::hours(1));
    let (survey_id, a, b) = (s.id, s.options[0].id, s.options[1].id);
    store.insert(s).await;

    let transport = LocalTransport {
        store: store.clone(),
        broadcaster: Some(broadcaster.clone()),
    };

    let mut alice = session();
    let mut bob = session();
    let listing = store.list_public().await.unwrap();
    alice.load(listing.clone());
    bob.load(listing);

    // tallies are hidden before voting
    assert!(!alice.shows_tallies(survey_id));

    alice.vote(&transport, survey_id, a).await.unwrap();
    assert!(alice.shows_tallies(survey_id));
    assert_eq!(alice.percentages(survey_id).unwrap(), vec![100.0, 0.0]);

    // bob receives alice's vote over the live channel
    bob.apply_update(updates.recv().await.unwrap());
    assert_eq!(bob.percentages(survey_id).unwrap(), vec![100.0, 0.0]);

    bob.vote(&transport, survey_id, b).await.unwrap();
    assert_eq!(bob.percentages(survey_id).unwrap(), vec![50.0, 50.0]);

    // and alice's view converges through the same channel
    alice.apply_update(updates.recv().await.unwrap());
    assert_eq!(alice.percentages(survey_id).unwrap(), vec![50.0, 50.0]);
}

#[tokio::test]
async fn expired_survey_is_listed_but_rejects_votes() {
    let store = MemoryStore::new();
    let s = survey("Old poll", &["Yes", "No"], -Duration::hours(1));
    let (survey_id, option_id) = (s.id, s.options[0].id);
    store.insert(s).await;

    let transport = LocalTransport {
        store: store.clone(),
        broadcaster: None,
    };

    let mut viewer = session();
    let listing = store.list_public().await.unwrap();
    assert_eq!(listing.len(), 1, "expired surveys stay in the listing");
    viewer.load(listing);

    let err = viewer
        .vote(&transport, survey_id, option_id)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Transport(TransportError::Rejected(ref msg))
        if msg == "This survey has expired."));

    // nothing was recorded anywhere
    assert!(!viewer.has_voted(survey_id));
    let unchanged = store
        .find_matching(survey_id, option_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.total_votes(), 0);
}

#[tokio::test]
async fn vote_without_broadcaster_still_succeeds() {
    let store = MemoryStore::new();
    let s = survey("Quiet mode", &["X"], Duration::hours(1));
    let (survey_id, option_id) = (s.id, s.options[0].id);
    store.insert(s.clone()).await;

    let transport = LocalTransport {
        store,
        broadcaster: None,
    };

    let mut viewer = session();
    viewer.load(vec![s]);
    viewer.vote(&transport, survey_id, option_id).await.unwrap();
    assert_eq!(viewer.percentages(survey_id).unwrap(), vec![100.0]);
}
