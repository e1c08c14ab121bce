// models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A published survey with its option tallies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Survey {
    pub id: Uuid,
    pub title: String,
    pub options: Vec<SurveyOption>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyOption {
    pub id: Uuid,
    pub text: String,
    pub votes: u64,
}

impl Survey {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn has_option(&self, option_id: Uuid) -> bool {
        self.options.iter().any(|o| o.id == option_id)
    }

    pub fn option_mut(&mut self, option_id: Uuid) -> Option<&mut SurveyOption> {
        self.options.iter_mut().find(|o| o.id == option_id)
    }

    pub fn total_votes(&self) -> u64 {
        self.options.iter().map(|o| o.votes).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn survey() -> Survey {
        Survey {
            id: Uuid::new_v4(),
            title: "Favorite language?".to_string(),
            options: vec![
                SurveyOption {
                    id: Uuid::new_v4(),
                    text: "Rust".to_string(),
                    votes: 3,
                },
                SurveyOption {
                    id: Uuid::new_v4(),
                    text: "Go".to_string(),
                    votes: 1,
                },
            ],
            expires_at: Utc::now() + Duration::hours(1),
        }
    }

    #[test]
    fn expiry_is_strict() {
        let s = survey();
        assert!(!s.is_expired(s.expires_at));
        assert!(s.is_expired(s.expires_at + Duration::seconds(1)));
    }

    #[test]
    fn total_votes_sums_options() {
        assert_eq!(survey().total_votes(), 4);
    }

    #[test]
    fn wire_format_uses_camel_case() {
        let json = serde_json::to_value(survey()).unwrap();
        assert!(json.get("expiresAt").is_some());
        assert!(json.get("expires_at").is_none());
    }
}
