//! The SMTP reply model and its multi-line decoder/encoder (component C3).
//!
//! A reply is a three-digit [`ReplyCode`] plus a free-form message. Replies
//! can span multiple lines ("multi-line reply group"): every line but the
//! last is tagged with `-` right after the code, the last with a space.
//! Every line in a group must carry the same code.

use crate::ascii::find_crlf;
use crate::error::CodecError;

/// The maximum number of bytes (including every CRLF) a single reply group
/// may occupy on the wire.
pub const MAX_REPLY_GROUP_LEN: usize = 4 * 1024;

/// A structured three-digit SMTP reply code.
///
/// `severity` is the first digit (`2`..=`5`), `category` the second
/// (`0`..=`5`), `detail` the third (`0`..=`9`), all stored as their numeric
/// value (not the ASCII byte).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ReplyCode {
    bytes: [u8; 3],
}

impl ReplyCode {
    /// Parses a reply code from its three ASCII digit bytes, enforcing the
    /// RFC 5321 digit ranges (severity `2..=5`, category `0..=5`, detail
    /// `0..=9`).
    pub fn parse(bytes: [u8; 3]) -> Option<Self> {
        let [severity, category, detail] = bytes;
        let in_range = matches!(severity, b'2'..=b'5')
            && matches!(category, b'0'..=b'5')
            && matches!(detail, b'0'..=b'9');
        in_range.then_some(ReplyCode { bytes })
    }

    /// Constructs a code from a well-formed literal, e.g. `ReplyCode::new(*b"250")`.
    ///
    /// # Panics
    /// Panics if `bytes` is not a valid reply code; only used for the
    /// built-in [`codes`] table where the literals are known-good.
    const fn new(bytes: [u8; 3]) -> Self {
        ReplyCode { bytes }
    }

    pub fn severity(&self) -> u8 {
        self.bytes[0] - b'0'
    }

    pub fn category(&self) -> u8 {
        self.bytes[1] - b'0'
    }

    pub fn detail(&self) -> u8 {
        self.bytes[2] - b'0'
    }

    pub fn as_str(&self) -> &str {
        // SAFETY: constructed only from ASCII digit bytes.
        std::str::from_utf8(&self.bytes).expect("reply code bytes are ASCII digits")
    }

    pub fn is_positive_completion(&self) -> bool {
        self.severity() == 2
    }

    pub fn is_positive_intermediate(&self) -> bool {
        self.severity() == 3
    }

    pub fn is_transient_negative(&self) -> bool {
        self.severity() == 4
    }

    pub fn is_permanent_negative(&self) -> bool {
        self.severity() == 5
    }

    pub fn is_erroneous(&self) -> bool {
        self.is_transient_negative() || self.is_permanent_negative()
    }
}

impl std::fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Well-known reply codes from RFC 5321 §4.2.3 that the connection driver
/// and commands check against directly.
pub mod codes {
    use super::ReplyCode;

    /// 220: `<domain>` Service ready (greeting).
    pub const READY: ReplyCode = ReplyCode::new(*b"220");
    /// 221: `<domain>` Service closing transmission channel (farewell).
    pub const CLOSING_CHANNEL: ReplyCode = ReplyCode::new(*b"221");
    /// 250: Requested mail action okay, completed.
    pub const OK: ReplyCode = ReplyCode::new(*b"250");
    /// 354: Start mail input; end with `<CRLF>.<CRLF>`.
    pub const START_MAIL_DATA: ReplyCode = ReplyCode::new(*b"354");
}

/// A decoded SMTP reply: a code shared by every line of the group, and the
/// concatenated message (every line's post-code text, each CRLF-terminated).
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Reply {
    code: ReplyCode,
    message: String,
}

impl Reply {
    /// Builds a reply from a code and a sequence of message lines (each
    /// without its own CRLF).
    pub fn new<I>(code: ReplyCode, lines: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut message = String::new();
        let mut any = false;
        for line in lines {
            message.push_str(line.as_ref());
            message.push_str("\r\n");
            any = true;
        }
        if !any {
            message.push_str("\r\n");
        }
        Reply { code, message }
    }

    /// Builds a single-line reply.
    pub fn single(code: ReplyCode, line: impl AsRef<str>) -> Self {
        Reply::new(code, [line.as_ref()])
    }

    pub fn code(&self) -> ReplyCode {
        self.code
    }

    /// The concatenated, CRLF-terminated message text.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The message split into its constituent lines (without CRLFs).
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.message.split("\r\n").filter(|l| !l.is_empty())
    }
}

/// Attempts to decode exactly one reply group from the front of `buf`.
///
/// Returns `Ok(None)` if `buf` does not yet contain a full group (more
/// bytes are needed); returns `Ok(Some((consumed, reply)))` on success,
/// where `consumed` is the exact number of bytes the group occupied.
pub fn decode_reply(buf: &[u8]) -> Result<Option<(usize, Reply)>, CodecError> {
    let mut offset = 0usize;
    let mut first_code: Option<ReplyCode> = None;
    let mut lines: Vec<String> = Vec::new();

    loop {
        let rel_crlf = match find_crlf(&buf[offset..]) {
            Some(rel) => rel,
            None => return Ok(None),
        };

        let line_end = offset + rel_crlf;
        let line = &buf[offset..line_end];
        let consumed = line_end + 2;

        if consumed > MAX_REPLY_GROUP_LEN {
            return Err(CodecError::ReplyTooLong);
        }
        if line.len() < 4 {
            return Err(CodecError::ReplyCodeUnparsable(
                String::from_utf8_lossy(line).into_owned(),
            ));
        }

        let code_bytes = [line[0], line[1], line[2]];
        let code = ReplyCode::parse(code_bytes).ok_or_else(|| {
            CodecError::ReplyCodeUnparsable(String::from_utf8_lossy(&line[..3]).into_owned())
        })?;

        match first_code {
            None => first_code = Some(code),
            Some(first) if first == code => {}
            Some(first) => {
                return Err(CodecError::ReplyCodesDiffer {
                    first,
                    current: code,
                })
            }
        }

        let sign = line[3];
        let text = String::from_utf8_lossy(&line[4..]).into_owned();
        lines.push(text);
        offset = consumed;

        match sign {
            b' ' => {
                let code = first_code.expect("set above");
                return Ok(Some((offset, Reply::new(code, lines))));
            }
            b'-' => continue,
            other => return Err(CodecError::ReplySignBad(other as char)),
        }
    }
}

/// Encodes `reply` into its multi-line wire representation.
pub fn encode_reply(reply: &Reply, out: &mut Vec<u8>) {
    let lines: Vec<&str> = {
        let mut v: Vec<&str> = reply.message.split("\r\n").collect();
        if v.last() == Some(&"") {
            v.pop();
        }
        v
    };
    let lines: &[&str] = if lines.is_empty() { &[""] } else { &lines };

    let code = reply.code.as_str().as_bytes();
    for (idx, line) in lines.iter().enumerate() {
        out.extend_from_slice(code);
        if idx + 1 == lines.len() {
            out.push(b' ');
        } else {
            out.push(b'-');
        }
        out.extend_from_slice(line.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decodes_single_line_reply() {
        let (consumed, reply) = decode_reply(b"250 OK\r\n").unwrap().unwrap();
        assert_eq!(consumed, 8);
        assert_eq!(reply.code(), codes::OK);
        assert_eq!(reply.message(), "OK\r\n");
    }

    #[test]
    fn decodes_multiline_reply_group() {
        let (consumed, reply) = decode_reply(b"221-hello\r\n221 world\r\n").unwrap().unwrap();
        assert_eq!(consumed, 23);
        assert_eq!(reply.code(), codes::CLOSING_CHANNEL);
        assert_eq!(reply.message(), "hello\r\nworld\r\n");
    }

    #[test]
    fn incomplete_without_crlf() {
        assert_eq!(decode_reply(b"250-par").unwrap(), None);
    }

    #[test]
    fn incomplete_dash_line_awaiting_terminator() {
        assert_eq!(decode_reply(b"221-a\r\n").unwrap(), None);
    }

    #[test]
    fn mismatched_codes_fail() {
        let err = decode_reply(b"221-a\r\n220 b\r\n").unwrap_err();
        assert_eq!(
            err,
            CodecError::ReplyCodesDiffer {
                first: codes::CLOSING_CHANNEL,
                current: ReplyCode::parse(*b"220").unwrap(),
            }
        );
    }

    #[test]
    fn bad_continuation_byte_fails() {
        let err = decode_reply(b"250xOK\r\n").unwrap_err();
        assert_eq!(err, CodecError::ReplySignBad('x'));
    }

    #[test]
    fn round_trips_through_encode() {
        let reply = Reply::new(codes::OK, ["line one", "line two"]);
        let mut buf = Vec::new();
        encode_reply(&reply, &mut buf);
        let (consumed, decoded) = decode_reply(&buf).unwrap().unwrap();
        assert_eq!(consumed, buf.len());
        assert_eq!(decoded, reply);
    }

    #[test]
    fn streaming_byte_by_byte_yields_exactly_one_reply() {
        let input = b"221-hello\r\n221 world\r\n";
        let mut buf = Vec::new();
        let mut got = None;
        for &byte in input {
            buf.push(byte);
            if let Some((consumed, reply)) = decode_reply(&buf).unwrap() {
                got = Some((consumed, reply));
                break;
            }
        }
        let (consumed, reply) = got.expect("reply should have been framed");
        assert_eq!(consumed, input.len());
        assert_eq!(reply.message(), "hello\r\nworld\r\n");
    }
}
