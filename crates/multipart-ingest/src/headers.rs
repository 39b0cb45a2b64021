//! Part header parsing: separates a raw part into its header block and content,
//! and pulls the field name, file name and content type out of the headers.

use std::collections::HashMap;

use crate::boundary::{find, LineEnding};
use crate::error::Diagnostic;

/// Header fields of one part. Names are stored lowercased.
#[derive(Debug, Clone, Default)]
pub(crate) struct PartHeaders {
    fields: HashMap<String, String>,
}

impl PartHeaders {
    fn parse(block: &[u8]) -> Self {
        let text = String::from_utf8_lossy(block);
        let mut fields: HashMap<String, String> = HashMap::new();
        let mut last: Option<String> = None;

        for line in text.split('\n') {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.starts_with([' ', '\t']) {
                // Folded continuation of the previous header.
                if let Some(value) = last.as_ref().and_then(|key| fields.get_mut(key)) {
                    value.push(' ');
                    value.push_str(line.trim());
                }
                continue;
            }
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let name = name.trim().to_ascii_lowercase();
            fields
                .entry(name.clone())
                .or_insert_with(|| value.trim().to_string());
            last = Some(name);
        }

        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// A part whose headers have been read. `content` still borrows from the body.
#[derive(Debug)]
pub(crate) struct ParsedPart<'a> {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub content: &'a [u8],
}

/// Splits `raw` at the first blank line and reads the disposition.
///
/// `raw` must already exclude the line break that precedes the next delimiter.
pub(crate) fn parse_part(
    raw: &[u8],
    line_ending: LineEnding,
    index: usize,
) -> Result<ParsedPart<'_>, Diagnostic> {
    let eol = line_ending.as_bytes();

    let (block, content) = if let Some(content) = raw.strip_prefix(eol) {
        (&raw[..0], content)
    } else {
        let separator = [eol, eol].concat();
        let at = find(raw, &separator, 0).ok_or(Diagnostic::PartHeaderMalformed { index })?;
        (&raw[..at], &raw[at + separator.len()..])
    };

    let headers = PartHeaders::parse(block);
    let disposition = headers
        .get("content-disposition")
        .map(Disposition::parse)
        .unwrap_or_default();

    let name = disposition
        .name
        .filter(|name| !name.is_empty())
        .ok_or(Diagnostic::PartNameMissing { index })?;

    let content_type = headers
        .get("content-type")
        .filter(|value| !value.is_empty())
        .map(str::to_string);

    Ok(ParsedPart {
        name,
        filename: disposition.filename,
        content_type,
        content,
    })
}

#[derive(Debug, Default)]
struct Disposition {
    name: Option<String>,
    filename: Option<String>,
}

impl Disposition {
    fn parse(value: &str) -> Self {
        let (_, params) = parameters(value);
        let mut disposition = Disposition::default();
        let mut extended_filename = None;

        for (key, value) in params {
            match key.as_str() {
                "name" => {
                    disposition.name.get_or_insert(value);
                }
                "filename" => {
                    disposition.filename.get_or_insert(value);
                }
                "filename*" => extended_filename = decode_extended(&value),
                _ => {}
            }
        }

        if extended_filename.is_some() {
            disposition.filename = extended_filename;
        }
        disposition
    }
}

/// Decodes an RFC 5987 `charset'language'percent-encoded` value.
fn decode_extended(value: &str) -> Option<String> {
    let mut pieces = value.splitn(3, '\'');
    let (_charset, _language, encoded) = (pieces.next()?, pieces.next()?, pieces.next()?);
    let bytes = urlencoding::decode_binary(encoded.as_bytes());
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

/// Splits a header value into its leading token and `key=value` parameters.
///
/// Keys are lowercased, values unquoted. Semicolons inside quotes do not split.
pub(crate) fn parameters(value: &str) -> (String, Vec<(String, String)>) {
    let mut segments = split_unquoted(value).into_iter();
    let head = segments.next().unwrap_or_default().trim().to_string();
    let params = segments
        .filter_map(|segment| {
            let (key, value) = segment.split_once('=')?;
            Some((key.trim().to_ascii_lowercase(), unquote(value)))
        })
        .collect();
    (head, params)
}

fn split_unquoted(value: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut chars = value.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '\\' if in_quotes => {
                chars.next_if(|(_, next)| matches!(*next, '"' | '\\'));
            }
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                segments.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&value[start..]);
    segments
}

/// Strips surrounding quotes. Only `\"` and `\\` are treated as escapes so that
/// Windows paths sent by older browsers survive intact.
fn unquote(raw: &str) -> String {
    let raw = raw.trim();
    let Some(inner) = raw
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    else {
        return raw.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next_if(|next| matches!(*next, '"' | '\\')) {
                out.push(next);
                continue;
            }
        }
        out.push(c);
    }
    out
}
