//! Part splitting: cuts a body into raw parts at anchored delimiter occurrences.

use crate::boundary::{find, Delimiter};

/// Raw parts of a body, in order, with preamble and epilogue removed.
#[derive(Debug)]
pub(crate) struct Split<'a> {
    pub parts: Vec<&'a [u8]>,
    /// False when the body ran out before a `--boundary--` closing marker.
    pub terminated: bool,
}

/// Splits `body` into raw parts.
///
/// Each part excludes the line break that precedes the following delimiter.
/// A delimiter only counts when it directly follows a line break and is itself
/// followed by a line break, `--`, or the end of the body, so delimiter-like
/// bytes inside file content never cause a split.
pub(crate) fn split_parts<'a>(body: &'a [u8], delimiter: &Delimiter) -> Split<'a> {
    let marker = delimiter.marker();
    let eol = delimiter.line_ending().as_bytes();
    let needle = [eol, marker].concat();

    let mut parts = Vec::new();
    let mut cursor = delimiter.first_offset() + marker.len();

    let terminated = loop {
        let rest = &body[cursor..];
        if rest.starts_with(b"--") {
            break true;
        }
        if !rest.starts_with(eol) {
            // Delimiter at the very end of the body.
            break false;
        }

        let content_start = cursor + eol.len();
        // An empty part shares its leading line break with the next delimiter.
        match next_delimiter(body, &needle, eol, content_start - eol.len()) {
            Some(at) => {
                parts.push(&body[content_start..at.max(content_start)]);
                cursor = at + needle.len();
            }
            None => {
                parts.push(&body[content_start..]);
                break false;
            }
        }
    };

    parts.retain(|part| !part.iter().all(u8::is_ascii_whitespace));
    Split { parts, terminated }
}

/// Position of the line break that starts the next real delimiter.
fn next_delimiter(body: &[u8], needle: &[u8], eol: &[u8], from: usize) -> Option<usize> {
    let mut search = from;
    while let Some(at) = find(body, needle, search) {
        let rest = &body[at + needle.len()..];
        if rest.is_empty() || rest.starts_with(eol) || rest.starts_with(b"--") {
            return Some(at);
        }
        search = at + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::detect_boundary;

    fn split(body: &[u8]) -> Split<'_> {
        let delimiter = detect_boundary(body, Some("b")).unwrap();
        split_parts(body, &delimiter)
    }

    #[test]
    fn test_splits_parts_and_drops_preamble_and_epilogue() {
        let body = b"preamble\r\n--b\r\none\r\n--b\r\ntwo\r\n--b--\r\nepilogue";
        let s = split(body);
        assert_eq!(s.parts, vec![&b"one"[..], &b"two"[..]]);
        assert!(s.terminated);
    }

    #[test]
    fn test_trailing_line_break_is_not_part_content() {
        let body = b"--b\r\nx\r\n\r\n--b--";
        let s = split(body);
        assert_eq!(s.parts, vec![&b"x\r\n"[..]]);
    }

    #[test]
    fn test_empty_and_whitespace_parts_are_discarded() {
        let body = b"--b\r\n--b\r\n \t\r\n--b\r\nreal\r\n--b--\r\n";
        let s = split(body);
        assert_eq!(s.parts, vec![&b"real"[..]]);
        assert!(s.terminated);
    }

    #[test]
    fn test_unanchored_marker_inside_content_does_not_split() {
        // Not preceded by a line break, then not followed by one.
        let body = b"--b\r\nab--b\r\ncd\r\n--bX\r\nef\r\n--b--";
        let s = split(body);
        assert_eq!(s.parts, vec![&b"ab--b\r\ncd\r\n--bX\r\nef"[..]]);
    }

    #[test]
    fn test_missing_closing_marker() {
        let body = b"--b\r\none\r\n--b\r\ntrailing";
        let s = split(body);
        assert_eq!(s.parts, vec![&b"one"[..], &b"trailing"[..]]);
        assert!(!s.terminated);
    }

    #[test]
    fn test_delimiter_at_end_of_body_without_dashes() {
        let body = b"--b\r\none\r\n--b";
        let s = split(body);
        assert_eq!(s.parts, vec![&b"one"[..]]);
        assert!(!s.terminated);
    }

    #[test]
    fn test_closing_marker_first_yields_no_parts() {
        let s = split(b"--b--\r\n");
        assert!(s.parts.is_empty());
        assert!(s.terminated);
    }

    #[test]
    fn test_lf_body() {
        let body = b"--b\none\n--b\ntwo\n--b--\n";
        let s = split(body);
        assert_eq!(s.parts, vec![&b"one"[..], &b"two"[..]]);
    }
}
