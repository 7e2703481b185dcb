//! ASCII-only helpers shared by the codec and address modules.
//!
//! SMTP is an ASCII-framed protocol; case-insensitivity only ever applies to
//! the ASCII range (verbs, option keywords, EHLO keywords). These helpers
//! fold exactly that range and leave everything else, including UTF-8
//! mailbox content permitted by SMTPUTF8, untouched.

/// Upper-cases a single ASCII byte, leaving non-ASCII bytes as-is.
pub fn to_ascii_upper(byte: u8) -> u8 {
    byte.to_ascii_uppercase()
}

/// Compares `haystack`'s prefix against `needle` using ASCII case folding.
///
/// Bytes outside `'a'..='z'`/`'A'..='Z'` are compared for exact equality, as
/// required by the command decoder's matching rule.
pub fn starts_with_ignore_ascii_case(haystack: &[u8], needle: &[u8]) -> bool {
    if haystack.len() < needle.len() {
        return false;
    }
    haystack[..needle.len()]
        .iter()
        .zip(needle.iter())
        .all(|(a, b)| a.eq_ignore_ascii_case(b))
}

/// Finds the offset of the first `\n` (0x0A) in `buf`.
pub fn find_lf(buf: &[u8]) -> Option<usize> {
    buf.iter().position(|&b| b == b'\n')
}

/// Finds the offset of the first CRLF in `buf`, returning the offset of the `\r`.
pub fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

/// A string wrapper that compares and hashes ignoring ASCII case.
///
/// Used for EHLO keywords and domain labels, where RFC 5321 treats case as
/// insignificant but the original casing is still worth preserving for
/// display.
#[derive(Debug, Clone, Eq)]
pub struct IgnoreAsciiCase(String);

impl IgnoreAsciiCase {
    pub fn new(inner: impl Into<String>) -> Self {
        IgnoreAsciiCase(inner.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for IgnoreAsciiCase {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl std::hash::Hash for IgnoreAsciiCase {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        for b in self.0.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
    }
}

impl std::fmt::Display for IgnoreAsciiCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn prefix_matches_ignore_ascii_case() {
        assert!(starts_with_ignore_ascii_case(b"HELO foo\r\n", b"helo "));
        assert!(starts_with_ignore_ascii_case(b"helo foo\r\n", b"HELO "));
        assert!(!starts_with_ignore_ascii_case(b"HEL", b"HELO "));
    }

    #[test]
    fn ignore_ascii_case_equality() {
        let a = IgnoreAsciiCase::new("SMTPUTF8");
        let b = IgnoreAsciiCase::new("smtputf8");
        assert_eq!(a, b);
    }

    #[test]
    fn find_crlf_finds_first_occurrence() {
        assert_eq!(find_crlf(b"abc\r\ndef\r\n"), Some(3));
        assert_eq!(find_crlf(b"abc"), None);
    }
}
