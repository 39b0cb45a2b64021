//! The orchestrator: body → boundary → parts → fields and files.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

use crate::boundary::detect_boundary;
use crate::coerce::coerce_value;
use crate::error::{Diagnostic, MultipartError};
use crate::files::collect_file;
use crate::headers::{parse_part, ParsedPart};
use crate::model::{ParseReport, ParseResult};
use crate::splitter::split_parts;

/// Parses a complete multipart body.
///
/// Never fails: malformed input yields an empty or partial result.
/// `declared_boundary` is the `boundary=` token from the request's Content-Type;
/// when `None` the body is scanned for one.
pub fn parse(body: &[u8], declared_boundary: Option<&str>) -> ParseResult {
    parse_with_diagnostics(body, declared_boundary).result
}

/// Like [`parse`], also returning a diagnostic for every part that was dropped
/// and every other irregularity seen along the way.
pub fn parse_with_diagnostics(body: &[u8], declared_boundary: Option<&str>) -> ParseReport {
    let mut report = ParseReport::default();

    let delimiter = match detect_boundary(body, declared_boundary) {
        Ok(delimiter) => delimiter,
        Err(_) => {
            report.record(Diagnostic::BoundaryNotFound);
            return report;
        }
    };

    let split = split_parts(body, &delimiter);
    for (index, raw) in split.parts.into_iter().enumerate() {
        match parse_part(raw, delimiter.line_ending(), index) {
            Ok(part) => absorb(&mut report.result, part),
            Err(diagnostic) => report.record(diagnostic),
        }
    }
    if !split.terminated {
        report.record(Diagnostic::MissingClosingDelimiter);
    }

    debug!(
        "multipart: parsed {} fields, {} files, dropped {} parts",
        report.result.fields.len(),
        report.result.files.len(),
        report.dropped_parts()
    );
    report
}

/// Decodes a base64-encoded body, then parses it.
pub fn parse_base64(
    encoded: &str,
    declared_boundary: Option<&str>,
) -> Result<ParseResult, MultipartError> {
    parse_base64_with_diagnostics(encoded, declared_boundary).map(|report| report.result)
}

pub fn parse_base64_with_diagnostics(
    encoded: &str,
    declared_boundary: Option<&str>,
) -> Result<ParseReport, MultipartError> {
    let body = decode_body(encoded)?;
    Ok(parse_with_diagnostics(&body, declared_boundary))
}

/// Standard base64 with any embedded whitespace or line wrapping ignored.
pub fn decode_body(encoded: &str) -> Result<Vec<u8>, MultipartError> {
    let compact: Vec<u8> = encoded
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    Ok(STANDARD.decode(compact)?)
}

fn absorb(result: &mut ParseResult, part: ParsedPart<'_>) {
    let ParsedPart {
        name,
        filename,
        content_type,
        content,
    } = part;

    match filename {
        Some(file_name) => {
            result
                .files
                .push(collect_file(name, file_name, content_type.as_deref(), content));
        }
        None => result.fields.insert(name, coerce_value(content)),
    }
}
