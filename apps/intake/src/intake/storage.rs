//! Object storage for uploaded files.
//!
//! `AppState` holds an `Arc<dyn FileStore>`; production uses `S3FileStore`
//! (MinIO locally, AWS in production).

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use multipart_ingest::FileAttachment;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::submission::SubmissionKind;

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Stores the file's bytes under `key`. Consumes the attachment so its buffer
    /// is released as soon as the upload completes.
    async fn put(&self, key: &str, file: FileAttachment) -> Result<(), AppError>;

    /// Removes an object written by `put`. Used to roll back a failed submission.
    async fn delete(&self, key: &str) -> Result<(), AppError>;
}

pub struct S3FileStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3FileStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl FileStore for S3FileStore {
    async fn put(&self, key: &str, file: FileAttachment) -> Result<(), AppError> {
        let size = file.size;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(file.mime_type)
            .content_length(size as i64)
            .body(ByteStream::from(file.content))
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 upload of {key} failed: {e}")))?;

        info!("Uploaded {size} bytes to s3://{}/{}", self.bucket, key);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 delete of {key} failed: {e}")))?;

        info!("Deleted s3://{}/{}", self.bucket, key);
        Ok(())
    }
}

/// `submissions/{kind}/{submission_id}/{index}-{safe_name}`
pub fn storage_key(
    kind: SubmissionKind,
    submission_id: Uuid,
    index: usize,
    file_name: &str,
) -> String {
    format!(
        "submissions/{}/{}/{}-{}",
        kind.as_str(),
        submission_id,
        index,
        safe_file_name(file_name)
    )
}

/// Keeps the last path component, then replaces anything outside `[A-Za-z0-9._-]`.
fn safe_file_name(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}
