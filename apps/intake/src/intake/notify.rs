//! Outbound webhook notifications for new submissions.
//!
//! Notification is best-effort: callers log failures and carry on.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::submission::{StoredFile, SubmissionKind};

const MAX_RETRIES: u32 = 3;
const BASE_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Webhook returned status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Webhook unavailable after {retries} retries")]
    Exhausted { retries: u32 },
}

/// Payload POSTed to the webhook.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionEvent {
    pub submission_id: Uuid,
    pub kind: SubmissionKind,
    pub fields: Value,
    pub files: Vec<StoredFile>,
    pub received_at: DateTime<Utc>,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &SubmissionEvent) -> Result<(), NotifyError>;
}

pub struct WebhookNotifier {
    client: Client,
    url: String,
    base_delay: Duration,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Result<Self, NotifyError> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(15)).build()?,
            url,
            base_delay: BASE_DELAY,
        })
    }

    /// Delay before the first retry; each later retry doubles it.
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    /// Retries on 429 and 5xx with exponential backoff.
    async fn notify(&self, event: &SubmissionEvent) -> Result<(), NotifyError> {
        let mut last_error: Option<NotifyError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = self.base_delay * (1 << (attempt - 1));
                warn!(
                    "Webhook attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self.client.post(&self.url).json(event).send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(NotifyError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                debug!("Webhook accepted submission {}", event.submission_id);
                return Ok(());
            }

            let message = response.text().await.unwrap_or_default();
            let error = NotifyError::Status {
                status: status.as_u16(),
                message,
            };
            if status.as_u16() == 429 || status.is_server_error() {
                last_error = Some(error);
                continue;
            }
            return Err(error);
        }

        Err(last_error.unwrap_or(NotifyError::Exhausted {
            retries: MAX_RETRIES,
        }))
    }
}
