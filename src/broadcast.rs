// broadcast.rs
use tokio::sync::broadcast;
use tracing::debug;

use crate::models::Survey;

/// Fan-out channel pushing updated surveys to every connected viewer.
///
/// Fire and forget: no acknowledgment, no retry. Deployments that cannot
/// hold long-lived connections simply run without one (`Option<Broadcaster>`
/// in the app state) and viewers fall back to re-fetching.
#[derive(Clone)]
pub struct Broadcaster {
    sender: broadcast::Sender<Survey>,
}

impl Broadcaster {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an updated survey to all current subscribers. Having no
    /// subscribers is not a failure.
    pub fn publish(&self, survey: &Survey) {
        let delivered = self.sender.send(survey.clone()).unwrap_or(0);
        debug!(survey = %survey.id, receivers = delivered, "vote update broadcast");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Survey> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        // plenty for a burst of votes; lagged viewers skip ahead
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SurveyOption;
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn survey() -> Survey {
        Survey {
            id: Uuid::new_v4(),
            title: "Best editor".to_string(),
            options: vec![SurveyOption {
                id: Uuid::new_v4(),
                text: "Vim".to_string(),
                votes: 0,
            }],
            expires_at: Utc::now() + Duration::hours(1),
        }
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_fine() {
        let broadcaster = Broadcaster::default();
        broadcaster.publish(&survey());
        assert_eq!(broadcaster.receiver_count(), 0);
    }

    #[tokio::test]
    async fn every_subscriber_receives_every_update() {
        let broadcaster = Broadcaster::default();
        let mut first = broadcaster.subscribe();
        let mut second = broadcaster.subscribe();

        let update = survey();
        broadcaster.publish(&update);

        assert_eq!(first.recv().await.unwrap(), update);
        assert_eq!(second.recv().await.unwrap(), update);
    }
}
