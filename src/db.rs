// src/db.rs
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Pool, Postgres};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Survey, SurveyOption};
use crate::store::TallyStore;

/// Postgres-backed tally store.
///
/// The increment is pushed down to the database as a single row update so
/// concurrent votes on the same survey never clobber each other; no
/// in-process lock is involved.
pub struct PgStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct SurveyRow {
    id: Uuid,
    title: String,
    expires_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OptionRow {
    id: Uuid,
    survey_id: Uuid,
    text: String,
    votes: i64,
}

impl From<OptionRow> for SurveyOption {
    fn from(row: OptionRow) -> Self {
        SurveyOption {
            id: row.id,
            text: row.text,
            votes: row.votes.max(0) as u64,
        }
    }
}

pub async fn create_pool(database_url: &str) -> Result<Pool<Postgres>, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_options(&self, survey_id: Uuid) -> Result<Vec<SurveyOption>, StoreError> {
        let rows: Vec<OptionRow> = sqlx::query_as(
            "SELECT id, survey_id, text, votes
             FROM survey_options
             WHERE survey_id = $1
             ORDER BY position",
        )
        .bind(survey_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl TallyStore for PgStore {
    async fn find_matching(
        &self,
        survey_id: Uuid,
        option_id: Uuid,
    ) -> Result<Option<Survey>, StoreError> {
        let row: Option<SurveyRow> = sqlx::query_as(
            "SELECT s.id, s.title, s.expires_at
             FROM surveys s
             JOIN survey_options o ON o.survey_id = s.id
             WHERE s.id = $1 AND o.id = $2",
        )
        .bind(survey_id)
        .bind(option_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let options = self.load_options(row.id).await?;
        Ok(Some(Survey {
            id: row.id,
            title: row.title,
            options,
            expires_at: row.expires_at,
        }))
    }

    async fn record_vote(
        &self,
        survey_id: Uuid,
        option_id: Uuid,
    ) -> Result<Option<Survey>, StoreError> {
        // single statement; the row-level increment is the atomic primitive
        // that makes concurrent votes on one option both land
        let result = sqlx::query(
            "UPDATE survey_options
             SET votes = votes + 1
             WHERE survey_id = $1 AND id = $2",
        )
        .bind(survey_id)
        .bind(option_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_matching(survey_id, option_id).await
    }

    async fn list_public(&self) -> Result<Vec<Survey>, StoreError> {
        let survey_rows: Vec<SurveyRow> =
            sqlx::query_as("SELECT id, title, expires_at FROM surveys ORDER BY expires_at")
                .fetch_all(&self.pool)
                .await?;

        let option_rows: Vec<OptionRow> = sqlx::query_as(
            "SELECT id, survey_id, text, votes
             FROM survey_options
             ORDER BY survey_id, position",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<Uuid, Vec<SurveyOption>> = HashMap::new();
        for row in option_rows {
            grouped.entry(row.survey_id).or_default().push(row.into());
        }

        Ok(survey_rows
            .into_iter()
            .map(|row| Survey {
                options: grouped.remove(&row.id).unwrap_or_default(),
                id: row.id,
                title: row.title,
                expires_at: row.expires_at,
            })
            .collect())
    }
}
