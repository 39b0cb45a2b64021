//! File attachment assembly. Content is copied verbatim; no decoding or trimming.

use crate::model::FileAttachment;

/// Mime type recorded when a file part declares none.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

pub fn collect_file(
    field_name: String,
    file_name: String,
    mime_type: Option<&str>,
    content: &[u8],
) -> FileAttachment {
    let mime_type = mime_type
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_MIME_TYPE)
        .to_string();

    FileAttachment {
        field_name,
        file_name,
        mime_type,
        content: content.to_vec(),
        size: content.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_mime_type_is_kept() {
        let f = collect_file("cv".into(), "a.pdf".into(), Some("application/pdf"), b"%PDF");
        assert_eq!(f.mime_type, "application/pdf");
        assert_eq!(f.size, 4);
        assert_eq!(f.content, b"%PDF");
    }

    #[test]
    fn test_missing_mime_type_falls_back() {
        let f = collect_file("cv".into(), "a.bin".into(), None, b"");
        assert_eq!(f.mime_type, DEFAULT_MIME_TYPE);
        assert_eq!(f.size, 0);

        let f = collect_file("cv".into(), "a.bin".into(), Some("  "), b"x");
        assert_eq!(f.mime_type, DEFAULT_MIME_TYPE);
    }

    #[test]
    fn test_content_is_not_trimmed() {
        let raw = b"\r\n  \x00\xff--\r\n";
        let f = collect_file("f".into(), "x".into(), None, raw);
        assert_eq!(f.content, raw.to_vec());
        assert_eq!(f.size, raw.len());
    }
}
