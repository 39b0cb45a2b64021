use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::submission::{StoredFile, SubmissionKind, SubmissionRow};

/// A submission ready to be written. Fields are already JSON.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub id: Uuid,
    pub kind: SubmissionKind,
    pub fields: Value,
    pub files: Vec<StoredFile>,
    pub dropped_parts: usize,
}

#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn insert(&self, submission: &NewSubmission) -> Result<SubmissionRow, AppError>;

    async fn fetch(&self, id: Uuid) -> Result<Option<SubmissionRow>, AppError>;
}

pub struct PgSubmissionStore {
    pool: PgPool,
}

impl PgSubmissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionStore for PgSubmissionStore {
    async fn insert(&self, submission: &NewSubmission) -> Result<SubmissionRow, AppError> {
        let files = serde_json::to_value(&submission.files)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("file metadata: {e}")))?;

        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"
            INSERT INTO submissions (id, kind, fields, files, dropped_parts)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(submission.id)
        .bind(submission.kind.as_str())
        .bind(&submission.fields)
        .bind(files)
        .bind(submission.dropped_parts as i32)
        .fetch_one(&self.pool)
        .await?;

        info!(
            "Stored {} submission {} with {} files",
            submission.kind.as_str(),
            submission.id,
            submission.files.len()
        );
        Ok(row)
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<SubmissionRow>, AppError> {
        Ok(
            sqlx::query_as::<_, SubmissionRow>("SELECT * FROM submissions WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }
}
