use std::fmt;

use smallvec::SmallVec;

use crate::{Error, Result};

/// One lookup step of a reference path: an array index or an object key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Index(u64),
    Key(String),
}

/// A parsed reference path.
///
/// The grammar is deliberately restricted so that resolution is a sequence of
/// plain container lookups from the document root, never an evaluation:
///
/// ```text
/// path       := "$" segment*
/// segment    := "[" index "]" | "[" quoted-key "]"
/// index      := one or more ASCII digits
/// quoted-key := JSON-style double-quoted string
/// ```
///
/// Quoted keys accept the JSON escapes `\\ \" \/ \b \f \n \r \t \uXXXX` and
/// reject raw control characters. A string that fails this grammar is not a
/// reference at all.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RefPath {
    segments: SmallVec<[Segment; 4]>,
}

impl RefPath {
    pub fn parse(input: &str) -> Result<RefPath> {
        let bytes = input.as_bytes();
        if bytes.first() != Some(&b'$') {
            return Err(Error::path("reference must start with `$`").with_path(input));
        }

        let mut segments = SmallVec::new();
        let mut idx = 1;
        while idx < bytes.len() {
            if bytes[idx] != b'[' {
                return Err(Error::path("expected `[` to open a segment").with_path(input));
            }
            idx += 1;
            match bytes.get(idx).copied() {
                Some(b'"') => {
                    let (key, next) = parse_quoted_key(input, idx)?;
                    idx = next;
                    segments.push(Segment::Key(key));
                }
                Some(byte) if byte.is_ascii_digit() => {
                    let start = idx;
                    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
                        idx += 1;
                    }
                    let index = input[start..idx]
                        .parse::<u64>()
                        .map_err(|_| Error::path("index does not fit in 64 bits").with_path(input))?;
                    segments.push(Segment::Index(index));
                }
                _ => {
                    return Err(Error::path("expected an index or a quoted key").with_path(input));
                }
            }
            if bytes.get(idx) != Some(&b']') {
                return Err(Error::path("expected `]` to close the segment").with_path(input));
            }
            idx += 1;
        }

        Ok(RefPath { segments })
    }

    /// Grammar check without keeping the parsed segments.
    pub fn matches(input: &str) -> bool {
        Self::parse(input).is_ok()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// `$` with no segments, i.e. the document root.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

fn parse_quoted_key(input: &str, start: usize) -> Result<(String, usize)> {
    let bytes = input.as_bytes();
    let mut out = String::new();
    let mut idx = start + 1;
    loop {
        let Some(&byte) = bytes.get(idx) else {
            return Err(Error::path("unterminated quoted key").with_path(input));
        };
        match byte {
            b'"' => return Ok((out, idx + 1)),
            b'\\' => {
                idx = decode_escape(input, idx + 1, &mut out)?;
            }
            0x00..=0x1f => {
                return Err(Error::path("raw control character in quoted key").with_path(input));
            }
            _ => {
                let ch = input[idx..]
                    .chars()
                    .next()
                    .ok_or_else(|| Error::path("invalid utf-8 boundary").with_path(input))?;
                out.push(ch);
                idx += ch.len_utf8();
            }
        }
    }
}

fn decode_escape(input: &str, idx: usize, out: &mut String) -> Result<usize> {
    let bytes = input.as_bytes();
    let Some(&byte) = bytes.get(idx) else {
        return Err(Error::path("unterminated escape").with_path(input));
    };
    match byte {
        b'"' => out.push('"'),
        b'\\' => out.push('\\'),
        b'/' => out.push('/'),
        b'b' => out.push('\u{0008}'),
        b'f' => out.push('\u{000C}'),
        b'n' => out.push('\n'),
        b'r' => out.push('\r'),
        b't' => out.push('\t'),
        b'u' => return decode_unicode_escape(input, idx + 1, out),
        _ => return Err(Error::path("invalid escape in quoted key").with_path(input)),
    }
    Ok(idx + 1)
}

fn decode_unicode_escape(input: &str, idx: usize, out: &mut String) -> Result<usize> {
    let first = parse_hex4(input, idx)?;
    let mut next = idx + 4;

    let scalar = match first {
        0xD800..=0xDBFF => {
            // High surrogate, must pair with a following \uXXXX low surrogate.
            let bytes = input.as_bytes();
            if bytes.get(next) != Some(&b'\\') || bytes.get(next + 1) != Some(&b'u') {
                return Err(Error::path("unpaired surrogate in quoted key").with_path(input));
            }
            let second = parse_hex4(input, next + 2)?;
            if !(0xDC00..=0xDFFF).contains(&second) {
                return Err(Error::path("unpaired surrogate in quoted key").with_path(input));
            }
            next += 6;
            0x10000 + ((first - 0xD800) << 10) + (second - 0xDC00)
        }
        0xDC00..=0xDFFF => {
            return Err(Error::path("unpaired surrogate in quoted key").with_path(input));
        }
        other => other,
    };

    let ch = char::from_u32(scalar)
        .ok_or_else(|| Error::path("invalid unicode escape in quoted key").with_path(input))?;
    out.push(ch);
    Ok(next)
}

fn parse_hex4(input: &str, idx: usize) -> Result<u32> {
    let digits = input
        .as_bytes()
        .get(idx..idx + 4)
        .ok_or_else(|| Error::path("truncated unicode escape").with_path(input))?;
    let mut value = 0u32;
    for &byte in digits {
        let nibble = match byte {
            b'0'..=b'9' => byte - b'0',
            b'a'..=b'f' => byte - b'a' + 10,
            b'A'..=b'F' => byte - b'A' + 10,
            _ => {
                return Err(
                    Error::path("non-hex digit in unicode escape").with_path(input)
                )
            }
        };
        value = (value << 4) | u32::from(nibble);
    }
    Ok(value)
}

impl fmt::Display for RefPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for segment in &self.segments {
            match segment {
                Segment::Index(index) => write!(f, "[{index}]")?,
                Segment::Key(key) => {
                    write!(f, "[\"")?;
                    write_escaped_key(f, key)?;
                    write!(f, "\"]")?;
                }
            }
        }
        Ok(())
    }
}

fn write_escaped_key(f: &mut fmt::Formatter<'_>, key: &str) -> fmt::Result {
    for ch in key.chars() {
        match ch {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\r' => write!(f, "\\r")?,
            '\t' => write!(f, "\\t")?,
            '\u{0008}' => write!(f, "\\b")?,
            '\u{000C}' => write!(f, "\\f")?,
            ch if (ch as u32) < 0x20 => write!(f, "\\u{:04x}", ch as u32)?,
            ch => write!(f, "{ch}")?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{RefPath, Segment};

    #[rstest::rstest]
    fn test_root_path() {
        let path = RefPath::parse("$").unwrap();
        assert!(path.is_root());
        assert_eq!(path.segments(), &[]);
        assert_eq!(path.to_string(), "$");
    }

    #[rstest::rstest]
    fn test_mixed_segments() {
        let path = RefPath::parse("$[\"players\"][3][\"name\"]").unwrap();
        assert_eq!(
            path.segments(),
            &[
                Segment::Key("players".to_string()),
                Segment::Index(3),
                Segment::Key("name".to_string()),
            ]
        );
        assert_eq!(path.to_string(), "$[\"players\"][3][\"name\"]");
    }

    #[rstest::rstest]
    fn test_escapes_decode() {
        let path = RefPath::parse("$[\"a\\\"b\\\\c\\/d\\n\"]").unwrap();
        assert_eq!(path.segments(), &[Segment::Key("a\"b\\c/d\n".to_string())]);
    }

    #[rstest::rstest]
    fn test_unicode_escape_and_surrogate_pair() {
        let path = RefPath::parse("$[\"\\u0041\"]").unwrap();
        assert_eq!(path.segments(), &[Segment::Key("A".to_string())]);

        let path = RefPath::parse("$[\"\\ud83d\\ude00\"]").unwrap();
        assert_eq!(path.segments(), &[Segment::Key("\u{1F600}".to_string())]);
    }

    #[rstest::rstest]
    #[case("")]
    #[case("x")]
    #[case("$x")]
    #[case("$[")]
    #[case("$[]")]
    #[case("$[0")]
    #[case("$[0]x")]
    #[case("$[-1]")]
    #[case("$['a']")]
    #[case("$[\"a]")]
    #[case("$[\"a\\q\"]")]
    #[case("$[\"\\u12\"]")]
    #[case("$[\"\\uzzzz\"]")]
    #[case("$[\"\\ud800\"]")]
    #[case("$[\"\\udc00\"]")]
    #[case("$[\"\t\"]")]
    fn test_rejects_non_matching(#[case] input: &str) {
        assert!(!RefPath::matches(input));
    }

    #[rstest::rstest]
    fn test_leading_zero_index_parses() {
        let path = RefPath::parse("$[05]").unwrap();
        assert_eq!(path.segments(), &[Segment::Index(5)]);
    }

    #[rstest::rstest]
    fn test_display_escapes_key() {
        let path = RefPath::parse("$[\"a\\\"b\"]").unwrap();
        assert_eq!(path.to_string(), "$[\"a\\\"b\"]");
        let reparsed = RefPath::parse(&path.to_string()).unwrap();
        assert_eq!(reparsed, path);
    }
}
