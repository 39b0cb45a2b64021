use multipart_ingest::{FieldValue, Fields, FileAttachment};
use serde::{Deserialize, Serialize};

use crate::models::submission::SubmissionKind;

pub const MAX_FILES_PER_SUBMISSION: usize = 5;
pub const MAX_FILE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldProblem {
    pub field: String,
    pub reason: String,
}

impl FieldProblem {
    fn new(field: &str, reason: &str) -> Self {
        Self {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Checks the required fields for `kind`. Returns every problem found, not just the first.
pub fn validate_fields(kind: SubmissionKind, fields: &Fields) -> Vec<FieldProblem> {
    let mut problems = Vec::new();

    for &name in kind.required_fields() {
        match fields.get(name) {
            None => problems.push(FieldProblem::new(name, "is required")),
            Some(FieldValue::Text(value)) if value.is_empty() => {
                problems.push(FieldProblem::new(name, "must not be empty"))
            }
            Some(FieldValue::Text(_)) => {}
            Some(_) => problems.push(FieldProblem::new(name, "must be a single text value")),
        }
    }

    if let Some(email) = fields.text("email") {
        if !email.is_empty() && !is_plausible_email(email) {
            problems.push(FieldProblem::new("email", "is not a valid email address"));
        }
    }

    problems
}

/// One `@`, a non-empty local part, and a dotted domain.
fn is_plausible_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain
            .split('.')
            .filter(|label| !label.is_empty())
            .count()
            >= 2
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Drops unselected file inputs and enforces the per-submission file limits.
pub fn select_files(files: Vec<FileAttachment>) -> Result<Vec<FileAttachment>, String> {
    let files: Vec<_> = files
        .into_iter()
        .filter(|f| !(f.file_name.is_empty() && f.size == 0))
        .collect();

    if files.len() > MAX_FILES_PER_SUBMISSION {
        return Err(format!(
            "At most {MAX_FILES_PER_SUBMISSION} files may be attached, got {}",
            files.len()
        ));
    }

    if let Some(too_big) = files.iter().find(|f| f.size > MAX_FILE_BYTES) {
        return Err(format!(
            "File '{}' is {} bytes; the limit is {MAX_FILE_BYTES} bytes",
            too_big.file_name, too_big.size
        ));
    }

    Ok(files)
}
