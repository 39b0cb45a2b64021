//! Boundary detection: resolves the delimiter a body was written with.
//!
//! The delimiter is `--` followed by the boundary token. It comes from the
//! caller's `Content-Type` when available; otherwise the body is scanned for
//! the first line that looks like one.

use thiserror::Error;

use crate::headers::parameters;

/// RFC 2046 limit on boundary token length.
pub const MAX_BOUNDARY_LEN: usize = 70;

/// Signal that a body carries no usable multipart delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no multipart boundary found")]
pub struct BoundaryNotFound;

/// Line terminator convention of a body. Fixed once per body from the first delimiter line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    CrLf,
    Lf,
}

impl LineEnding {
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            LineEnding::CrLf => b"\r\n",
            LineEnding::Lf => b"\n",
        }
    }
}

/// A delimiter located in a specific body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiter {
    marker: Vec<u8>,
    line_ending: LineEnding,
    first_offset: usize,
}

impl Delimiter {
    /// The full delimiter bytes, `--` plus the boundary token.
    pub fn marker(&self) -> &[u8] {
        &self.marker
    }

    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Offset of the first anchored delimiter. Everything before it is preamble.
    pub fn first_offset(&self) -> usize {
        self.first_offset
    }
}

/// Resolves the delimiter for `body`.
///
/// A declared boundary (the `boundary=` token, without the leading `--`) wins
/// when given; it must actually occur in the body as an anchored delimiter.
/// Without one, the first line of the form `--token` is taken.
pub fn detect_boundary(body: &[u8], declared: Option<&str>) -> Result<Delimiter, BoundaryNotFound> {
    let declared = declared
        .map(|token| token.trim().trim_matches('"'))
        .filter(|token| !token.is_empty());

    match declared {
        Some(token) => locate(body, marker_for(token.as_bytes()), 0),
        None => scan(body),
    }
}

/// Extracts the boundary token from a `multipart/*; boundary=...` header value.
pub fn boundary_from_content_type(value: &str) -> Option<String> {
    let (media_type, params) = parameters(value);
    let is_multipart = media_type
        .get(..10)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("multipart/"));
    if !is_multipart {
        return None;
    }

    params
        .into_iter()
        .find(|(key, _)| key == "boundary")
        .map(|(_, token)| token)
        .filter(|token| !token.is_empty() && token.len() <= MAX_BOUNDARY_LEN)
}

fn marker_for(token: &[u8]) -> Vec<u8> {
    let mut marker = Vec::with_capacity(token.len() + 2);
    marker.extend_from_slice(b"--");
    marker.extend_from_slice(token);
    marker
}

/// Finds the first occurrence of `marker` at or after `from` that starts a line
/// and is followed by a line break, `--`, or the end of the body.
fn locate(body: &[u8], marker: Vec<u8>, from: usize) -> Result<Delimiter, BoundaryNotFound> {
    let mut search = from;
    while let Some(at) = find(body, &marker, search) {
        search = at + 1;

        if at != 0 && body[at - 1] != b'\n' {
            continue;
        }

        let rest = &body[at + marker.len()..];
        let line_ending = if rest.starts_with(b"\r\n") {
            LineEnding::CrLf
        } else if rest.starts_with(b"\n") {
            LineEnding::Lf
        } else if rest.is_empty() || rest.starts_with(b"--") {
            // Closing marker first: take the convention from the line before it.
            if at >= 2 && &body[at - 2..at] == b"\r\n" {
                LineEnding::CrLf
            } else if at >= 1 {
                LineEnding::Lf
            } else {
                LineEnding::CrLf
            }
        } else {
            continue;
        };

        return Ok(Delimiter {
            marker,
            line_ending,
            first_offset: at,
        });
    }

    Err(BoundaryNotFound)
}

fn scan(body: &[u8]) -> Result<Delimiter, BoundaryNotFound> {
    let mut line_start = 0;
    while line_start < body.len() {
        let line_end = find(body, b"\n", line_start).unwrap_or(body.len());
        let line = &body[line_start..line_end];
        let line = line.strip_suffix(b"\r").unwrap_or(line);

        if let Some(token) = line.strip_prefix(b"--") {
            if is_valid_token(token) {
                return locate(body, line.to_vec(), line_start);
            }
        }

        line_start = line_end + 1;
    }
    Err(BoundaryNotFound)
}

/// RFC 2046 `bchars`, 1 to 70 of them, not ending in a space.
fn is_valid_token(token: &[u8]) -> bool {
    const SPECIALS: &[u8] = b"'()+_,-./:=? ";
    !token.is_empty()
        && token.len() <= MAX_BOUNDARY_LEN
        && token.last() != Some(&b' ')
        && token
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || SPECIALS.contains(b))
}

/// Byte-substring search starting at `from`.
pub(crate) fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}
