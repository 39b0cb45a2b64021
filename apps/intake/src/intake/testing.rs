//! In-memory collaborators for pipeline and router tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use multipart_ingest::FileAttachment;
use uuid::Uuid;

use crate::config::Config;
use crate::errors::AppError;
use crate::intake::notify::{Notifier, NotifyError, SubmissionEvent};
use crate::intake::repository::{NewSubmission, SubmissionStore};
use crate::intake::storage::FileStore;
use crate::models::submission::SubmissionRow;
use crate::state::AppState;

pub const BOUNDARY: &str = "----IntakeTestBoundary";

#[derive(Default)]
pub struct MemoryFileStore {
    pub uploads: Mutex<Vec<(String, Vec<u8>)>>,
    /// When set, `put` fails once this many objects are held.
    pub capacity: Mutex<Option<usize>>,
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn put(&self, key: &str, file: FileAttachment) -> Result<(), AppError> {
        let mut uploads = self.uploads.lock().unwrap();
        if let Some(capacity) = *self.capacity.lock().unwrap() {
            if uploads.len() >= capacity {
                return Err(AppError::Storage(format!("bucket full, rejected {key}")));
            }
        }
        uploads.push((key.to_string(), file.content));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.uploads.lock().unwrap().retain(|(stored, _)| stored != key);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySubmissionStore {
    pub rows: Mutex<Vec<SubmissionRow>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl SubmissionStore for MemorySubmissionStore {
    async fn insert(&self, submission: &NewSubmission) -> Result<SubmissionRow, AppError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        let row = SubmissionRow {
            id: submission.id,
            kind: submission.kind.as_str().to_string(),
            fields: submission.fields.clone(),
            files: serde_json::to_value(&submission.files).unwrap(),
            dropped_parts: submission.dropped_parts as i32,
            created_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<SubmissionRow>, AppError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|row| row.id == id)
            .cloned())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub events: Mutex<Vec<SubmissionEvent>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, event: &SubmissionEvent) -> Result<(), NotifyError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Exhausted { retries: 0 });
        }
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

pub struct Fakes {
    pub files: Arc<MemoryFileStore>,
    pub submissions: Arc<MemorySubmissionStore>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/intake_test".to_string(),
        s3_bucket: "intake-test".to_string(),
        s3_endpoint: "http://localhost:9000".to_string(),
        aws_access_key_id: "test".to_string(),
        aws_secret_access_key: "test".to_string(),
        notify_webhook_url: None,
        port: 0,
        rust_log: "debug".to_string(),
        max_body_bytes: 1024 * 1024,
    }
}

pub fn test_state() -> (AppState, Fakes) {
    let fakes = Fakes {
        files: Arc::new(MemoryFileStore::default()),
        submissions: Arc::new(MemorySubmissionStore::default()),
        notifier: Arc::new(RecordingNotifier::default()),
    };
    let state = AppState {
        submissions: fakes.submissions.clone(),
        files: fakes.files.clone(),
        notifier: Some(fakes.notifier.clone()),
        config: test_config(),
    };
    (state, fakes)
}

/// A complete candidate application carrying `cv` as the uploaded file.
pub fn application_body(cv: &[u8]) -> Vec<u8> {
    application_body_with_files(&[("cv", "Jane CV.pdf", cv)])
}

/// A complete candidate application with one file part per `(field, file name, content)`.
pub fn application_body_with_files(files: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in [
        ("firstName", "Jane"),
        ("lastName", "Doe"),
        ("email", "jane@example.com"),
    ] {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (field, file_name, content) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
                 Content-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}
