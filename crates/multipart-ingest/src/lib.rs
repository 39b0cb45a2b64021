//! In-memory `multipart/form-data` ingestion.
//!
//! Takes a complete request body (raw bytes, or base64 text as some transports
//! deliver it) and returns the text fields and file attachments it carries.
//! File content is copied out byte-for-byte; delimiter-like bytes inside a file
//! never cause a split.
//!
//! Everything here is synchronous and free of shared state, so the entry points
//! can be called from any number of request handlers concurrently.
//!
//! ```
//! let body = b"--X\r\n\
//!     Content-Disposition: form-data; name=\"firstName\"\r\n\r\nJane\r\n\
//!     --X--\r\n";
//! let result = multipart_ingest::parse(body, Some("X"));
//! assert_eq!(result.fields.text("firstName"), Some("Jane"));
//! ```

pub mod boundary;
pub mod coerce;
pub mod error;
pub mod files;
mod headers;
pub mod model;
mod parser;
mod splitter;

pub use boundary::{boundary_from_content_type, detect_boundary, BoundaryNotFound, Delimiter};
pub use error::{Diagnostic, MultipartError};
pub use files::DEFAULT_MIME_TYPE;
pub use model::{FieldValue, Fields, FileAttachment, ParseReport, ParseResult};
pub use parser::{
    decode_body, parse, parse_base64, parse_base64_with_diagnostics, parse_with_diagnostics,
};
