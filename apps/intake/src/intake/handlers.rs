//! Axum route handlers for the intake API.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use bytes::Bytes;
use uuid::Uuid;

use crate::errors::AppError;
use crate::intake::pipeline::{process_submission, SubmissionResponse};
use crate::models::submission::{SubmissionKind, SubmissionRow};
use crate::state::AppState;

type Created = (StatusCode, Json<SubmissionResponse>);

async fn submit(
    state: &AppState,
    kind: SubmissionKind,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<Created, AppError> {
    let response = process_submission(state, kind, headers, body).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/v1/applications
///
/// Candidate application: personal details plus a CV upload.
pub async fn handle_application(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Created, AppError> {
    submit(&state, SubmissionKind::Application, &headers, body).await
}

/// POST /api/v1/vacancies
///
/// Client vacancy registration, usually with a job description attached.
pub async fn handle_vacancy(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Created, AppError> {
    submit(&state, SubmissionKind::Vacancy, &headers, body).await
}

/// POST /api/v1/enquiries
pub async fn handle_enquiry(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Created, AppError> {
    submit(&state, SubmissionKind::Enquiry, &headers, body).await
}

/// GET /api/v1/submissions/:id
pub async fn handle_get_submission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SubmissionRow>, AppError> {
    let row = state
        .submissions
        .fetch(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Submission {id} not found")))?;
    Ok(Json(row))
}
