use serde::Serialize;
use thiserror::Error;

/// Fatal errors. Only transport decoding can fail a parse outright.
#[derive(Debug, Error)]
pub enum MultipartError {
    #[error("request body is not valid base64: {0}")]
    BodyDecode(#[from] base64::DecodeError),
}

/// Non-fatal signals raised while parsing. Parsing always continues past these.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    #[error("no multipart boundary found in body")]
    BoundaryNotFound,

    #[error("part {index} has no header/content separator")]
    PartHeaderMalformed { index: usize },

    #[error("part {index} has no usable field name")]
    PartNameMissing { index: usize },

    #[error("body ended without a closing boundary")]
    MissingClosingDelimiter,
}

impl Diagnostic {
    /// True when the signal means a part was left out of the result.
    pub fn drops_part(&self) -> bool {
        matches!(
            self,
            Diagnostic::PartHeaderMalformed { .. } | Diagnostic::PartNameMissing { .. }
        )
    }
}
