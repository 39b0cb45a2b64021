use std::sync::Arc;

use crate::config::Config;
use crate::intake::notify::Notifier;
use crate::intake::repository::SubmissionStore;
use crate::intake::storage::FileStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Submission records. Default: `PgSubmissionStore`.
    pub submissions: Arc<dyn SubmissionStore>,
    /// Uploaded file bytes. Default: `S3FileStore`.
    pub files: Arc<dyn FileStore>,
    /// Present only when NOTIFY_WEBHOOK_URL is configured.
    pub notifier: Option<Arc<dyn Notifier>>,
    pub config: Config,
}
