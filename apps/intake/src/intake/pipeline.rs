//! Submission pipeline shared by every form endpoint:
//! parse → validate → upload files → persist → notify.

use axum::http::{header::CONTENT_TYPE, HeaderMap};
use bytes::Bytes;
use multipart_ingest::{
    boundary_from_content_type, parse_base64_with_diagnostics, parse_with_diagnostics,
    FileAttachment, MultipartError, ParseReport,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::intake::notify::SubmissionEvent;
use crate::intake::repository::NewSubmission;
use crate::intake::storage::storage_key;
use crate::intake::validation::{select_files, validate_fields};
use crate::models::submission::{StoredFile, SubmissionKind};
use crate::state::AppState;

/// Set by transports that hand the body over as base64 text.
pub const BODY_ENCODING_HEADER: &str = "x-body-encoding";

#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub submission_id: Uuid,
    pub kind: SubmissionKind,
    pub fields: Value,
    pub files: Vec<StoredFile>,
    pub dropped_parts: usize,
}

pub async fn process_submission(
    state: &AppState,
    kind: SubmissionKind,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<SubmissionResponse, AppError> {
    let report = parse_request(headers, body).await?;
    for diagnostic in &report.diagnostics {
        warn!("{} submission: {diagnostic}", kind.as_str());
    }
    let dropped_parts = report.dropped_parts();
    let ParseReport { result, .. } = report;

    let problems = validate_fields(kind, &result.fields);
    if !problems.is_empty() {
        let detail = problems
            .iter()
            .map(|p| format!("{} {}", p.field, p.reason))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(AppError::Validation(detail));
    }
    let files = select_files(result.files).map_err(AppError::UnprocessableEntity)?;

    let fields = serde_json::to_value(&result.fields)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("field serialization: {e}")))?;

    let submission_id = Uuid::new_v4();
    let stored = upload_files(state, kind, submission_id, files).await?;

    let submission = NewSubmission {
        id: submission_id,
        kind,
        fields,
        files: stored,
        dropped_parts,
    };
    let row = match state.submissions.insert(&submission).await {
        Ok(row) => row,
        Err(e) => {
            discard_uploads(state, &submission.files).await;
            return Err(e);
        }
    };

    if let Some(notifier) = &state.notifier {
        let event = SubmissionEvent {
            submission_id,
            kind,
            fields: submission.fields.clone(),
            files: submission.files.clone(),
            received_at: row.created_at,
        };
        if let Err(e) = notifier.notify(&event).await {
            warn!("Notification for submission {submission_id} failed: {e}");
        }
    }

    info!(
        "Accepted {} submission {} ({} files, {} dropped parts)",
        kind.as_str(),
        submission_id,
        submission.files.len(),
        dropped_parts
    );

    Ok(SubmissionResponse {
        submission_id,
        kind,
        fields: submission.fields,
        files: submission.files,
        dropped_parts,
    })
}

/// Uploads every file, or none: a failed upload removes the ones before it.
async fn upload_files(
    state: &AppState,
    kind: SubmissionKind,
    submission_id: Uuid,
    files: Vec<FileAttachment>,
) -> Result<Vec<StoredFile>, AppError> {
    let mut stored = Vec::with_capacity(files.len());
    for (index, file) in files.into_iter().enumerate() {
        let key = storage_key(kind, submission_id, index, &file.file_name);
        let meta = StoredFile {
            field_name: file.field_name.clone(),
            file_name: file.file_name.clone(),
            mime_type: file.mime_type.clone(),
            size: file.size,
            storage_key: key,
        };
        if let Err(e) = state.files.put(&meta.storage_key, file).await {
            discard_uploads(state, &stored).await;
            return Err(e);
        }
        stored.push(meta);
    }
    Ok(stored)
}

/// Best-effort removal of objects that no submission row will reference.
async fn discard_uploads(state: &AppState, stored: &[StoredFile]) {
    for file in stored {
        match state.files.delete(&file.storage_key).await {
            Ok(()) => debug!("Rolled back upload {}", file.storage_key),
            Err(e) => warn!("Orphaned upload {} left in storage: {e}", file.storage_key),
        }
    }
}

/// Runs the parser off the async runtime; it is CPU-bound over the whole body.
async fn parse_request(headers: &HeaderMap, body: Bytes) -> Result<ParseReport, AppError> {
    let declared = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(boundary_from_content_type);
    let base64 = headers
        .get(BODY_ENCODING_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("base64"));

    let report = tokio::task::spawn_blocking(move || parse_body(&body, declared.as_deref(), base64))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("parser task failed: {e}")))??;
    Ok(report)
}

fn parse_body(
    body: &[u8],
    declared_boundary: Option<&str>,
    base64: bool,
) -> Result<ParseReport, MultipartError> {
    if base64 {
        parse_base64_with_diagnostics(&String::from_utf8_lossy(body), declared_boundary)
    } else {
        Ok(parse_with_diagnostics(body, declared_boundary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::sync::atomic::Ordering;

    use crate::intake::testing::{
        application_body, application_body_with_files, test_state, BOUNDARY,
    };

    fn multipart_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_str(&format!("multipart/form-data; boundary={BOUNDARY}")).unwrap(),
        );
        headers
    }

    #[tokio::test]
    async fn test_application_is_stored_with_its_cv() {
        let (state, fakes) = test_state();
        let cv: Vec<u8> = (0..=255u8).collect();

        let response = process_submission(
            &state,
            SubmissionKind::Application,
            &multipart_headers(),
            Bytes::from(application_body(&cv)),
        )
        .await
        .unwrap();

        assert_eq!(response.fields["firstName"], "Jane");
        assert_eq!(response.files.len(), 1);
        assert_eq!(response.files[0].size, 256);
        assert!(response.files[0]
            .storage_key
            .starts_with("submissions/application/"));

        let uploads = fakes.files.uploads.lock().unwrap();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].1, cv);

        assert_eq!(fakes.submissions.rows.lock().unwrap().len(), 1);
        assert_eq!(fakes.notifier.events.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_base64_body_is_decoded() {
        use base64::{engine::general_purpose::STANDARD, Engine as _};

        let (state, fakes) = test_state();
        let mut headers = multipart_headers();
        headers.insert(BODY_ENCODING_HEADER, HeaderValue::from_static("base64"));
        let encoded = STANDARD.encode(application_body(b"%PDF-1.7"));

        let response = process_submission(
            &state,
            SubmissionKind::Application,
            &headers,
            Bytes::from(encoded),
        )
        .await
        .unwrap();

        assert_eq!(response.files[0].size, 8);
        assert_eq!(fakes.files.uploads.lock().unwrap()[0].1, b"%PDF-1.7");
    }

    #[tokio::test]
    async fn test_bad_base64_is_rejected_before_anything_is_stored() {
        let (state, fakes) = test_state();
        let mut headers = multipart_headers();
        headers.insert(BODY_ENCODING_HEADER, HeaderValue::from_static("base64"));

        let err = process_submission(
            &state,
            SubmissionKind::Application,
            &headers,
            Bytes::from_static(b"!!not base64!!"),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert!(fakes.submissions.rows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_non_multipart_body_fails_validation() {
        let (state, fakes) = test_state();
        let err = process_submission(
            &state,
            SubmissionKind::Enquiry,
            &HeaderMap::new(),
            Bytes::from_static(b"name=Jane&email=jane@example.com"),
        )
        .await
        .unwrap_err();

        match err {
            AppError::Validation(detail) => assert!(detail.contains("email is required")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(fakes.files.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_notifier_failure_does_not_fail_submission() {
        let (state, fakes) = test_state();
        fakes.notifier.fail.store(true, Ordering::SeqCst);

        let response = process_submission(
            &state,
            SubmissionKind::Application,
            &multipart_headers(),
            Bytes::from(application_body(b"cv")),
        )
        .await;

        assert!(response.is_ok());
        assert_eq!(fakes.submissions.rows.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_insert_removes_uploaded_files() {
        let (state, fakes) = test_state();
        fakes.submissions.fail.store(true, Ordering::SeqCst);

        let err = process_submission(
            &state,
            SubmissionKind::Application,
            &multipart_headers(),
            Bytes::from(application_body_with_files(&[
                ("cv", "cv.pdf", &b"cv"[..]),
                ("coverLetter", "letter.pdf", &b"letter"[..]),
            ])),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
        assert!(fakes.files.uploads.lock().unwrap().is_empty());
        assert!(fakes.notifier.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_upload_removes_earlier_files() {
        let (state, fakes) = test_state();
        *fakes.files.capacity.lock().unwrap() = Some(2);

        let err = process_submission(
            &state,
            SubmissionKind::Application,
            &multipart_headers(),
            Bytes::from(application_body_with_files(&[
                ("cv", "cv.pdf", &b"one"[..]),
                ("portfolio", "portfolio.pdf", &b"two"[..]),
                ("coverLetter", "letter.pdf", &b"three"[..]),
            ])),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Storage(_)));
        assert!(fakes.files.uploads.lock().unwrap().is_empty());
        assert!(fakes.submissions.rows.lock().unwrap().is_empty());
    }
}
