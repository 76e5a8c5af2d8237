use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use super::StorageError;
use crate::models::candidate::{CandidateRecord, CandidateSummary};

/// A candidate record together with the store's internal id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCandidate {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub record: CandidateRecord,
}

/// Document store for candidate records. Insert-only; records are never
/// updated or deleted.
#[async_trait]
pub trait CandidateStore: Send + Sync {
    /// Inserts a record and returns the store-generated id.
    async fn insert(&self, record: &CandidateRecord) -> Result<String, StorageError>;

    /// Finds the first record whose top-level string `field` equals `value`.
    async fn find_one(
        &self,
        field: &str,
        value: &str,
    ) -> Result<Option<StoredCandidate>, StorageError>;

    /// Finds a record by the store's internal id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<StoredCandidate>, StorageError>;

    async fn list_summaries(&self) -> Result<Vec<CandidateSummary>, StorageError>;
}

#[derive(FromRow)]
struct CandidateRow {
    id: Uuid,
    document: Json<CandidateRecord>,
}

impl From<CandidateRow> for StoredCandidate {
    fn from(row: CandidateRow) -> Self {
        StoredCandidate {
            id: row.id.to_string(),
            record: row.document.0,
        }
    }
}

#[derive(FromRow)]
struct SummaryRow {
    id: Uuid,
    candidate_id: String,
    introduction: Option<String>,
    skills: Option<Json<Vec<String>>>,
    created_at: DateTime<Utc>,
}

impl From<SummaryRow> for CandidateSummary {
    fn from(row: SummaryRow) -> Self {
        CandidateSummary {
            id: row.id.to_string(),
            candidate_id: row.candidate_id,
            introduction: row.introduction.unwrap_or_default(),
            skills: row.skills.map(|s| s.0).unwrap_or_default(),
            created_at: row.created_at,
        }
    }
}

/// PostgreSQL-backed store keeping each record as a JSONB document.
#[derive(Clone)]
pub struct PgCandidateStore {
    pool: PgPool,
}

impl PgCandidateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CandidateStore for PgCandidateStore {
    async fn insert(&self, record: &CandidateRecord) -> Result<String, StorageError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO candidates (id, candidate_id, document, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(id)
        .bind(&record.candidate_id)
        .bind(Json(record))
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;

        info!("Inserted candidate {} as {id}", record.candidate_id);
        Ok(id.to_string())
    }

    async fn find_one(
        &self,
        field: &str,
        value: &str,
    ) -> Result<Option<StoredCandidate>, StorageError> {
        let row = sqlx::query_as::<_, CandidateRow>(
            r#"
            SELECT id, document
            FROM candidates
            WHERE document ->> $1 = $2
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(field)
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(StoredCandidate::from))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<StoredCandidate>, StorageError> {
        let row = sqlx::query_as::<_, CandidateRow>(
            "SELECT id, document FROM candidates WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(StoredCandidate::from))
    }

    async fn list_summaries(&self) -> Result<Vec<CandidateSummary>, StorageError> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT id,
                   candidate_id,
                   document ->> 'introduction' AS introduction,
                   document -> 'skills' AS skills,
                   created_at
            FROM candidates
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CandidateSummary::from).collect())
    }
}
