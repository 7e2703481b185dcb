//! `MAIL FROM` argument record and its option grammar.

use crate::address::Address;
use crate::error::CodecError;

/// The `BODY=` value, restricted to the three advertised encodings.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Mime {
    SevenBit,
    EightBitMime,
    BinaryMime,
}

impl Mime {
    fn parse(value: &str) -> Result<Self, CodecError> {
        match value.to_ascii_uppercase().as_str() {
            "7BIT" => Ok(Mime::SevenBit),
            "8BITMIME" => Ok(Mime::EightBitMime),
            "BINARYMIME" => Ok(Mime::BinaryMime),
            _ => Err(CodecError::MimeUnsupported(value.to_owned())),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Mime::SevenBit => "7BIT",
            Mime::EightBitMime => "8BITMIME",
            Mime::BinaryMime => "BINARYMIME",
        }
    }
}

/// The `RET=` value: request the full message or only headers on bounce.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Ret {
    Full,
    Hdrs,
}

impl Ret {
    fn parse(value: &str) -> Result<Self, CodecError> {
        match value.to_ascii_uppercase().as_str() {
            "FULL" => Ok(Ret::Full),
            "HDRS" => Ok(Ret::Hdrs),
            _ => Err(CodecError::RetUnsupported(value.to_owned())),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Ret::Full => "FULL",
            Ret::Hdrs => "HDRS",
        }
    }
}

/// Arguments of a `MAIL FROM:<reverse-path>` command.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct MailFromArgs {
    pub reverse_path: Address,
    pub mime: Option<Mime>,
    pub size: Option<u64>,
    pub envelope_id: Option<String>,
    pub ret: Option<Ret>,
    pub use_smtp_utf8: bool,
}

impl MailFromArgs {
    pub fn new(reverse_path: Address) -> Self {
        MailFromArgs {
            reverse_path,
            mime: None,
            size: None,
            envelope_id: None,
            ret: None,
            use_smtp_utf8: false,
        }
    }

    pub(crate) fn decode(remainder: &str) -> Result<Self, CodecError> {
        let mut segments = remainder.split(' ').filter(|s| !s.is_empty());
        let address = segments
            .next()
            .ok_or(CodecError::AddressNotFound)
            .and_then(Address::parse)?;
        let mut args = MailFromArgs::new(address);

        for segment in segments {
            let (key, value) = split_option(segment);
            match key.to_ascii_uppercase().as_str() {
                "BODY" => {
                    if args.mime.is_some() {
                        return Err(CodecError::MailArgDuplicated("BODY".to_owned()));
                    }
                    args.mime = Some(Mime::parse(value)?);
                }
                "SIZE" => {
                    if args.size.is_some() {
                        return Err(CodecError::MailArgDuplicated("SIZE".to_owned()));
                    }
                    args.size = value.parse::<u64>().ok();
                }
                "ENVID" => {
                    if args.envelope_id.is_some() {
                        return Err(CodecError::MailArgDuplicated("ENVID".to_owned()));
                    }
                    args.envelope_id = Some(value.to_owned());
                }
                "RET" => {
                    if args.ret.is_some() {
                        return Err(CodecError::MailArgDuplicated("RET".to_owned()));
                    }
                    args.ret = Some(Ret::parse(value)?);
                }
                "SMTPUTF8" => {
                    if args.use_smtp_utf8 {
                        return Err(CodecError::MailArgDuplicated("SMTPUTF8".to_owned()));
                    }
                    args.use_smtp_utf8 = true;
                }
                other => return Err(CodecError::ArgumentUnsupported(other.to_owned())),
            }
        }

        Ok(args)
    }

    pub(crate) fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(self.reverse_path.to_string().as_bytes());
        if let Some(mime) = self.mime {
            write_option(out, "BODY", mime.as_str());
        }
        if let Some(size) = self.size {
            write_option(out, "SIZE", &size.to_string());
        }
        if let Some(envid) = &self.envelope_id {
            write_option(out, "ENVID", envid);
        }
        if let Some(ret) = self.ret {
            write_option(out, "RET", ret.as_str());
        }
        if self.use_smtp_utf8 {
            out.push(b' ');
            out.extend_from_slice(b"SMTPUTF8");
        }
    }
}

fn split_option(segment: &str) -> (&str, &str) {
    match segment.split_once('=') {
        Some((key, value)) => (key, value),
        None => (segment, ""),
    }
}

fn write_option(out: &mut Vec<u8>, key: &str, value: &str) {
    out.push(b' ');
    out.extend_from_slice(key.as_bytes());
    out.push(b'=');
    out.extend_from_slice(value.as_bytes());
}
