// Form intake: the site's application, vacancy and enquiry forms.
// Every endpoint is a thin caller of `pipeline::process_submission`, which
// owns parsing (via multipart_ingest), validation, storage and notification.

pub mod handlers;
pub mod notify;
pub mod pipeline;
pub mod repository;
pub mod storage;
pub mod validation;

#[cfg(test)]
pub mod testing;
