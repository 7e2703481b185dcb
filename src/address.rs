//! Mailbox addresses and client identities (component C1).

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::error::CodecError;

/// A parsed mailbox, rendered on the wire as `<local@domain>`.
///
/// `raw` always contains exactly one `@`; the angle brackets are stripped
/// on parse and re-added on render. Immutable after construction.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Address {
    raw: String,
}

impl Address {
    /// Parses a mailbox from its bracketed or bare wire form.
    pub fn parse(input: &str) -> Result<Self, CodecError> {
        let inner = input.strip_prefix('<').and_then(|s| s.strip_suffix('>'))
            .unwrap_or(input);
        if inner.matches('@').count() != 1 {
            return Err(CodecError::AddressUnparsable(input.to_owned()));
        }
        Ok(Address {
            raw: inner.to_owned(),
        })
    }

    /// The mailbox without surrounding angle brackets, e.g. `local@domain`.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.raw)
    }
}

/// The identity a client presents in `HELO`/`EHLO`.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum ClientIdentity {
    Domain(String),
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
}

impl ClientIdentity {
    /// Classifies `input` as an IPv4 literal, an IPv6 literal, or (the
    /// fallback) an opaque domain string. No further validation is applied
    /// to the domain case.
    pub fn parse(input: &str) -> Self {
        let bracketed = input
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .unwrap_or(input);
        let ipv6 = bracketed.strip_prefix("IPv6:").unwrap_or(bracketed);

        if let Ok(v4) = input.parse::<Ipv4Addr>() {
            return ClientIdentity::Ipv4(v4);
        }
        if let Ok(v4) = bracketed.parse::<Ipv4Addr>() {
            return ClientIdentity::Ipv4(v4);
        }
        if let Ok(v6) = ipv6.parse::<Ipv6Addr>() {
            return ClientIdentity::Ipv6(v6);
        }
        ClientIdentity::Domain(input.to_owned())
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientIdentity::Domain(d) => f.write_str(d),
            ClientIdentity::Ipv4(v4) => write!(f, "[{}]", v4),
            ClientIdentity::Ipv6(v6) => write!(f, "[IPv6:{}]", v6),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_bracketed_address() {
        let a = Address::parse("<a@b.com>").unwrap();
        assert_eq!(a.raw(), "a@b.com");
        assert_eq!(a.to_string(), "<a@b.com>");
    }

    #[test]
    fn parses_bare_address() {
        let a = Address::parse("a@b.com").unwrap();
        assert_eq!(a.raw(), "a@b.com");
    }

    #[test]
    fn rejects_missing_at() {
        assert!(Address::parse("<nope>").is_err());
    }

    #[test]
    fn rejects_multiple_at() {
        assert!(Address::parse("<a@b@c>").is_err());
    }

    #[test]
    fn classifies_ipv4() {
        assert_eq!(
            ClientIdentity::parse("192.0.2.1"),
            ClientIdentity::Ipv4("192.0.2.1".parse().unwrap())
        );
        assert_eq!(
            ClientIdentity::parse("[192.0.2.1]"),
            ClientIdentity::Ipv4("192.0.2.1".parse().unwrap())
        );
    }

    #[test]
    fn classifies_ipv6() {
        assert_eq!(
            ClientIdentity::parse("[IPv6:::1]"),
            ClientIdentity::Ipv6("::1".parse().unwrap())
        );
    }

    #[test]
    fn falls_back_to_domain() {
        assert_eq!(
            ClientIdentity::parse("mail.example.com"),
            ClientIdentity::Domain("mail.example.com".to_owned())
        );
    }
}
