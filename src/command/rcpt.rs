//! `RCPT TO` argument record and its option grammar.

use std::collections::BTreeSet;

use crate::address::Address;
use crate::error::CodecError;

/// A single DSN notify condition.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum NotifyCode {
    Success,
    Failure,
    Delay,
}

impl NotifyCode {
    fn as_str(&self) -> &'static str {
        match self {
            NotifyCode::Success => "SUCCESS",
            NotifyCode::Failure => "FAILURE",
            NotifyCode::Delay => "DELAY",
        }
    }
}

/// The `NOTIFY=` value: either the `NEVER` singleton or a non-empty,
/// duplicate-free subset of [`NotifyCode`].
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum NotifyOn {
    Never,
    Codes(BTreeSet<NotifyCode>),
}

impl NotifyOn {
    fn parse(value: &str) -> Result<Self, CodecError> {
        if value.eq_ignore_ascii_case("NEVER") {
            return Ok(NotifyOn::Never);
        }
        let mut set = BTreeSet::new();
        let mut any = false;
        for token in value.split(',') {
            if token.is_empty() {
                continue;
            }
            any = true;
            let code = match token.to_ascii_uppercase().as_str() {
                "SUCCESS" => NotifyCode::Success,
                "FAILURE" => NotifyCode::Failure,
                "DELAY" => NotifyCode::Delay,
                other => return Err(CodecError::NotifyUnsupported(other.to_owned())),
            };
            if !set.insert(code) {
                return Err(CodecError::NotifyArgDuplicated(token.to_owned()));
            }
        }
        if !any {
            return Err(CodecError::NotifyNotFound);
        }
        Ok(NotifyOn::Codes(set))
    }

    fn render(&self) -> String {
        match self {
            NotifyOn::Never => "NEVER".to_owned(),
            NotifyOn::Codes(set) => set
                .iter()
                .map(NotifyCode::as_str)
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

/// Arguments of a `RCPT TO:<forward-path>` command.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct RcptToArgs {
    pub forward_path: Address,
    pub original_forward_path: Option<(String, Address)>,
    pub notify_on: Option<NotifyOn>,
}

impl RcptToArgs {
    pub fn new(forward_path: Address) -> Self {
        RcptToArgs {
            forward_path,
            original_forward_path: None,
            notify_on: None,
        }
    }

    pub(crate) fn decode(remainder: &str) -> Result<Self, CodecError> {
        let mut segments = remainder.split(' ').filter(|s| !s.is_empty());
        let address = segments
            .next()
            .ok_or(CodecError::AddressNotFound)
            .and_then(Address::parse)?;
        let mut args = RcptToArgs::new(address);

        for segment in segments {
            let (key, value) = match segment.split_once('=') {
                Some((k, v)) => (k, v),
                None => (segment, ""),
            };
            match key.to_ascii_uppercase().as_str() {
                "ORCPT" => {
                    if args.original_forward_path.is_some() {
                        return Err(CodecError::RcptArgDuplicated("ORCPT".to_owned()));
                    }
                    let (label, nested) = value
                        .split_once(';')
                        .ok_or_else(|| CodecError::AddressUnparsable(value.to_owned()))?;
                    let nested = Address::parse(nested)?;
                    args.original_forward_path = Some((label.to_owned(), nested));
                }
                "NOTIFY" => {
                    if args.notify_on.is_some() {
                        return Err(CodecError::RcptArgDuplicated("NOTIFY".to_owned()));
                    }
                    args.notify_on = Some(NotifyOn::parse(value)?);
                }
                other => return Err(CodecError::ArgumentUnsupported(other.to_owned())),
            }
        }

        Ok(args)
    }

    pub(crate) fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.forward_path.to_string().as_bytes());
        if let Some((label, nested)) = &self.original_forward_path {
            out.push(b' ');
            out.extend_from_slice(b"ORCPT=");
            out.extend_from_slice(label.as_bytes());
            out.push(b';');
            out.extend_from_slice(nested.raw().as_bytes());
        }
        if let Some(notify) = &self.notify_on {
            out.push(b' ');
            out.extend_from_slice(b"NOTIFY=");
            out.extend_from_slice(notify.render().as_bytes());
        }
    }
}
