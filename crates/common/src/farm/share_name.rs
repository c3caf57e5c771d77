//! Share filename convention
//!
//! Share files are named `<stem>.<NNN>`, the way `gfsplit` writes them. The
//! rule is positional: the last dot sits exactly four bytes before the end of
//! the name and at least three bytes after its start. The three bytes after
//! the dot are read like C `atoi`, so `doc.007`, `doc. 42` and `doc.9zz` are
//! all accepted and only the numeric value is range checked.

use std::fmt;

/// Length of the `.NNN` suffix, dot included
pub const SHARE_SUFFIX_LEN: usize = 4;
/// Shortest stem accepted in front of the suffix
pub const MIN_STEM_LEN: usize = 3;

/// Reasons a filename is not a share name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShareNameError {
    #[error("name has no dot")]
    MissingDot,
    #[error("last dot is not {SHARE_SUFFIX_LEN} bytes from the end")]
    MisplacedDot,
    #[error("stem is shorter than {MIN_STEM_LEN} bytes")]
    StemTooShort,
    #[error("share index {0} is outside 1..=255")]
    IndexOutOfRange(i32),
}

/// A parsed share filename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareName {
    pub stem: String,
    pub index: u8,
}

impl ShareName {
    /// Parse `name` according to the share naming convention
    pub fn parse(name: &str) -> Result<Self, ShareNameError> {
        let bytes = name.as_bytes();
        let dot = bytes
            .iter()
            .rposition(|b| *b == b'.')
            .ok_or(ShareNameError::MissingDot)?;

        if bytes.len() < SHARE_SUFFIX_LEN || dot != bytes.len() - SHARE_SUFFIX_LEN {
            return Err(ShareNameError::MisplacedDot);
        }
        if dot < MIN_STEM_LEN {
            return Err(ShareNameError::StemTooShort);
        }

        let value = atoi(&bytes[dot + 1..]);
        let index = u8::try_from(value)
            .ok()
            .filter(|i| *i >= 1)
            .ok_or(ShareNameError::IndexOutOfRange(value))?;

        Ok(Self {
            // the dot is ASCII, so slicing there stays on a char boundary
            stem: name[..dot].to_string(),
            index,
        })
    }
}

impl fmt::Display for ShareName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}", self.stem, self.index)
    }
}

/// C `atoi` over a short byte slice: leading whitespace, optional sign, then
/// the longest run of decimal digits. No digits yields zero.
fn atoi(bytes: &[u8]) -> i32 {
    let start = bytes
        .iter()
        .position(|b| !matches!(b, b' ' | b'\t' | b'\n' | b'\x0b' | b'\x0c' | b'\r'))
        .unwrap_or(bytes.len());
    let mut rest = &bytes[start..];

    let negative = rest.first() == Some(&b'-');
    if matches!(rest.first(), Some(b'-' | b'+')) {
        rest = &rest[1..];
    }

    let magnitude = rest
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .fold(0i32, |acc, b| {
            acc.saturating_mul(10).saturating_add(i32::from(b - b'0'))
        });

    if negative {
        -magnitude
    } else {
        magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(name: &str) -> Result<(String, u8), ShareNameError> {
        ShareName::parse(name).map(|s| (s.stem, s.index))
    }

    #[test]
    fn test_parse_padded_indices() {
        assert_eq!(parse("doc.001"), Ok(("doc".to_string(), 1)));
        assert_eq!(parse("doc.042"), Ok(("doc".to_string(), 42)));
        assert_eq!(parse("doc.255"), Ok(("doc".to_string(), 255)));
    }

    #[test]
    fn test_parse_every_valid_index() {
        for i in 1..=255u8 {
            let name = format!("secret.txt.{:03}", i);
            assert_eq!(parse(&name), Ok(("secret.txt".to_string(), i)));
        }
    }

    #[test]
    fn test_stem_may_contain_dots() {
        assert_eq!(parse("a.b.c.010"), Ok(("a.b.c".to_string(), 10)));
    }

    #[test]
    fn test_only_dot_position_is_checked() {
        assert_eq!(parse("doc. 12"), Ok(("doc".to_string(), 12)));
        assert_eq!(parse("doc.+07"), Ok(("doc".to_string(), 7)));
        assert_eq!(parse("doc.3zz"), Ok(("doc".to_string(), 3)));
    }

    #[test]
    fn test_rejects_missing_dot() {
        assert_eq!(parse("document"), Err(ShareNameError::MissingDot));
    }

    #[test]
    fn test_rejects_short_suffix() {
        assert_eq!(parse("doc.1"), Err(ShareNameError::MisplacedDot));
        assert_eq!(parse("doc.12"), Err(ShareNameError::MisplacedDot));
        assert_eq!(parse("doc.1234"), Err(ShareNameError::MisplacedDot));
        assert_eq!(parse(".12"), Err(ShareNameError::MisplacedDot));
    }

    #[test]
    fn test_rejects_short_stem() {
        assert_eq!(parse("ab.001"), Err(ShareNameError::StemTooShort));
        assert_eq!(parse(".001"), Err(ShareNameError::StemTooShort));
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert_eq!(parse("doc.000"), Err(ShareNameError::IndexOutOfRange(0)));
        assert_eq!(parse("doc.256"), Err(ShareNameError::IndexOutOfRange(256)));
        assert_eq!(parse("doc.999"), Err(ShareNameError::IndexOutOfRange(999)));
        assert_eq!(parse("doc.-01"), Err(ShareNameError::IndexOutOfRange(-1)));
        assert_eq!(parse("doc.abc"), Err(ShareNameError::IndexOutOfRange(0)));
    }

    #[test]
    fn test_display_pads_index() {
        let name = ShareName::parse("notes.007").unwrap();
        assert_eq!(name.to_string(), "notes.007");
    }
}
