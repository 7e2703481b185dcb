//! The command model and its byte-exact codec (component C2).
//!
//! Decoding frames exactly one `CRLF`-terminated line at a time and never
//! looks past it; encoding is the exact inverse, preserving the argument
//! order `address, BODY?, SIZE, ENVID, RET?, SMTPUTF8?` for `MAIL FROM` and
//! `address, ORCPT?, NOTIFY?` for `RCPT TO`.

mod mail;
mod rcpt;

pub use mail::{Mime, Ret, MailFromArgs};
pub use rcpt::{NotifyCode, NotifyOn, RcptToArgs};

use crate::address::ClientIdentity;
use crate::ascii::{find_lf, starts_with_ignore_ascii_case};
use crate::error::CodecError;

/// The shortest well-formed command, `NOOP\r\n`.
const MIN_COMMAND_LEN: usize = 6;
/// The longest command line this decoder will frame.
const MAX_COMMAND_LEN: usize = 1024;

/// A decoded client command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Helo(ClientIdentity),
    Ehlo(ClientIdentity),
    MailFrom(MailFromArgs),
    RcptTo(RcptToArgs),
    Data,
    Rset,
    StartTls,
    Noop,
    Quit,
}

/// One entry of the ordered verb table: a literal prefix and the parser it
/// hands the remainder to. Literals that already include their own `CRLF`
/// (`DATA`, `RSET`, `STARTTLS`, `NOOP`, `QUIT`) take no remainder.
struct VerbEntry {
    literal: &'static [u8],
    has_own_crlf: bool,
}

const VERB_TABLE: &[VerbEntry] = &[
    VerbEntry { literal: b"HELO ", has_own_crlf: false },
    VerbEntry { literal: b"EHLO ", has_own_crlf: false },
    VerbEntry { literal: b"MAIL FROM:", has_own_crlf: false },
    VerbEntry { literal: b"RCPT TO:", has_own_crlf: false },
    VerbEntry { literal: b"DATA\r\n", has_own_crlf: true },
    VerbEntry { literal: b"RSET\r\n", has_own_crlf: true },
    VerbEntry { literal: b"STARTTLS\r\n", has_own_crlf: true },
    VerbEntry { literal: b"NOOP\r\n", has_own_crlf: true },
    VerbEntry { literal: b"QUIT\r\n", has_own_crlf: true },
];

/// Attempts to decode exactly one command line from the front of `buf`.
///
/// Returns `Ok(None)` when `buf` does not yet contain a full `LF`-terminated
/// line; the caller must leave the read cursor untouched in that case.
pub fn decode_command(buf: &[u8]) -> Result<Option<(usize, Command)>, CodecError> {
    let lf = match find_lf(buf) {
        Some(pos) => pos,
        None => return Ok(None),
    };

    if lf == 0 || buf[lf - 1] != b'\r' {
        return Err(CodecError::CrlfNotFound);
    }

    let line_len = lf + 1;
    let line = &buf[..line_len];

    if line_len < MIN_COMMAND_LEN {
        return Err(CodecError::CommandTooShort {
            line: String::from_utf8_lossy(line).into_owned(),
        });
    }
    if line_len > MAX_COMMAND_LEN {
        return Err(CodecError::CommandTooLong);
    }

    for entry in VERB_TABLE {
        if !starts_with_ignore_ascii_case(line, entry.literal) {
            continue;
        }

        if entry.has_own_crlf {
            let command = match entry.literal {
                b"DATA\r\n" => Command::Data,
                b"RSET\r\n" => Command::Rset,
                b"STARTTLS\r\n" => Command::StartTls,
                b"NOOP\r\n" => Command::Noop,
                b"QUIT\r\n" => Command::Quit,
                _ => unreachable!("exhaustive over VERB_TABLE"),
            };
            return Ok(Some((line_len, command)));
        }

        let remainder_bytes = &line[entry.literal.len()..line_len - 2];
        let remainder = std::str::from_utf8(remainder_bytes)
            .map_err(|_| CodecError::CommandUnknown {
                line: String::from_utf8_lossy(line).into_owned(),
            })?;

        let command = if entry.literal == b"HELO " {
            Command::Helo(ClientIdentity::parse(remainder))
        } else if entry.literal == b"EHLO " {
            Command::Ehlo(ClientIdentity::parse(remainder))
        } else if entry.literal == b"MAIL FROM:" {
            Command::MailFrom(MailFromArgs::decode(remainder)?)
        } else {
            Command::RcptTo(RcptToArgs::decode(remainder)?)
        };
        return Ok(Some((line_len, command)));
    }

    Err(CodecError::CommandUnknown {
        line: String::from_utf8_lossy(line).into_owned(),
    })
}

/// Encodes `command` into `out`, byte-exact with what [`decode_command`]
/// accepts.
pub fn encode_command(command: &Command, out: &mut Vec<u8>) {
    match command {
        Command::Helo(id) => {
            out.extend_from_slice(b"HELO ");
            out.extend_from_slice(id.to_string().as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        Command::Ehlo(id) => {
            out.extend_from_slice(b"EHLO ");
            out.extend_from_slice(id.to_string().as_bytes());
            out.extend_from_slice(b"\r\n");
        }
        Command::MailFrom(args) => {
            out.extend_from_slice(b"MAIL FROM:");
            args.encode(out);
            out.extend_from_slice(b"\r\n");
        }
        Command::RcptTo(args) => {
            out.extend_from_slice(b"RCPT TO:");
            args.encode(out);
            out.extend_from_slice(b"\r\n");
        }
        Command::Data => out.extend_from_slice(b"DATA\r\n"),
        Command::Rset => out.extend_from_slice(b"RSET\r\n"),
        Command::StartTls => out.extend_from_slice(b"STARTTLS\r\n"),
        Command::Noop => out.extend_from_slice(b"NOOP\r\n"),
        Command::Quit => out.extend_from_slice(b"QUIT\r\n"),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::address::Address;

    fn roundtrip(command: Command) {
        let mut buf = Vec::new();
        encode_command(&command, &mut buf);
        let (consumed, decoded) = decode_command(&buf).unwrap().unwrap();
        assert_eq!(consumed, buf.len());
        assert_eq!(decoded, command);
    }

    #[test]
    fn decodes_ehlo() {
        let (consumed, command) = decode_command(b"EHLO test.com\r\n").unwrap().unwrap();
        assert_eq!(consumed, 15);
        assert_eq!(
            command,
            Command::Ehlo(ClientIdentity::Domain("test.com".to_owned()))
        );
    }

    #[test]
    fn verbs_are_case_insensitive() {
        for line in ["noop\r\n", "NOOP\r\n", "NoOp\r\n"] {
            let (_, command) = decode_command(line.as_bytes()).unwrap().unwrap();
            assert_eq!(command, Command::Noop);
        }
    }

    #[test]
    fn six_byte_noop_is_accepted() {
        assert_eq!(decode_command(b"NOOP\r\n").unwrap().unwrap().0, 6);
    }

    #[test]
    fn five_byte_line_is_too_short() {
        let err = decode_command(b"A\r\n").unwrap_err();
        assert!(matches!(err, CodecError::CommandTooShort { .. }));
    }

    #[test]
    fn incomplete_without_lf() {
        assert_eq!(decode_command(b"NOOP").unwrap(), None);
    }

    #[test]
    fn decodes_mail_from_with_options() {
        let (_, command) = decode_command(b"MAIL FROM: <a@b.com> SIZE=10 ENVID=ID\r\n")
            .unwrap()
            .unwrap();
        let expected = {
            let mut args = MailFromArgs::new(Address::parse("<a@b.com>").unwrap());
            args.size = Some(10);
            args.envelope_id = Some("ID".to_owned());
            Command::MailFrom(args)
        };
        assert_eq!(command, expected);
    }

    #[test]
    fn mail_from_roundtrips_in_canonical_order() {
        let mut args = MailFromArgs::new(Address::parse("<a@b.com>").unwrap());
        args.mime = Some(Mime::EightBitMime);
        args.size = Some(10);
        args.envelope_id = Some("ID".to_owned());
        args.ret = Some(Ret::Full);
        args.use_smtp_utf8 = true;
        roundtrip(Command::MailFrom(args));
    }

    #[test]
    fn decodes_rcpt_to_with_notify_list() {
        let (_, command) =
            decode_command(b"RCPT TO: <x@y.com> NOTIFY=FAILURE,SUCCESS,DELAY\r\n")
                .unwrap()
                .unwrap();
        let Command::RcptTo(args) = command else {
            panic!("expected RcptTo");
        };
        let NotifyOn::Codes(set) = args.notify_on.unwrap() else {
            panic!("expected Codes(..)");
        };
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn rcpt_to_roundtrips() {
        let mut args = RcptToArgs::new(Address::parse("<x@y.com>").unwrap());
        args.notify_on = Some(NotifyOn::Never);
        roundtrip(Command::RcptTo(args));
    }

    #[test]
    fn same_bytes_fed_twice_yield_two_independent_commands() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"RCPT TO: <x@y.com> NOTIFY=FAILURE,SUCCESS,DELAY\r\n");
        buf.extend_from_slice(b"RCPT TO: <x@y.com> NOTIFY=FAILURE,SUCCESS,DELAY\r\n");
        let (first_len, first) = decode_command(&buf).unwrap().unwrap();
        let (second_len, second) = decode_command(&buf[first_len..]).unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(first_len, second_len);
    }

    #[test]
    fn simple_verbs_roundtrip() {
        for command in [Command::Data, Command::Rset, Command::StartTls, Command::Noop, Command::Quit] {
            roundtrip(command);
        }
    }
}
