use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Which site form a submission came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    Application,
    Vacancy,
    Enquiry,
}

impl SubmissionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionKind::Application => "application",
            SubmissionKind::Vacancy => "vacancy",
            SubmissionKind::Enquiry => "enquiry",
        }
    }

    /// Form fields that must be present and non-empty.
    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            SubmissionKind::Application => &["firstName", "lastName", "email"],
            SubmissionKind::Vacancy => &["companyName", "contactName", "email"],
            SubmissionKind::Enquiry => &["name", "email", "message"],
        }
    }
}

/// Metadata for one uploaded file. The bytes themselves live in object storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFile {
    pub field_name: String,
    pub file_name: String,
    pub mime_type: String,
    pub size: usize,
    pub storage_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SubmissionRow {
    pub id: Uuid,
    pub kind: String,
    pub fields: Value,
    pub files: Value,
    pub dropped_parts: i32,
    pub created_at: DateTime<Utc>,
}
