//! Error taxonomy.
//!
//! Two tiers, per the wire spec: [`CodecError`] is the decoder/encoder
//! tier (recoverable as "need more data" only at the `Incomplete` variant,
//! fatal to the connection otherwise), and [`ConnectionError`] /
//! [`ConnectError`] are the tier the connection driver and `connect()`
//! surface to callers.

use thiserror::Error;

use crate::reply::{Reply, ReplyCode};

/// Errors produced while decoding or encoding SMTP commands and replies.
///
/// `Incomplete` never escapes the `tokio_util::codec::Decoder` boundary: it
/// is translated to `Ok(None)` there. Every other variant is fatal to the
/// connection that produced it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Not enough bytes buffered yet to frame a full command or reply.
    #[error("incomplete frame")]
    Incomplete,

    #[error("no bytes available")]
    BytesNotFound,

    #[error("line is not terminated by CRLF")]
    CrlfNotFound,

    #[error("command line too short: {line:?}")]
    CommandTooShort { line: String },

    #[error("command line exceeds the 1024 byte limit")]
    CommandTooLong,

    #[error("unrecognized command verb: {line:?}")]
    CommandUnknown { line: String },

    #[error("address not found")]
    AddressNotFound,

    #[error("address could not be parsed: {0:?}")]
    AddressUnparsable(String),

    #[error("cannot encode an absent required value")]
    StringIsNil,

    #[error("unsupported argument keyword: {0:?}")]
    ArgumentUnsupported(String),

    #[error("unsupported BODY value: {0:?}")]
    MimeUnsupported(String),

    #[error("unsupported RET value: {0:?}")]
    RetUnsupported(String),

    #[error("duplicated MAIL FROM argument: {0:?}")]
    MailArgDuplicated(String),

    #[error("duplicated RCPT TO argument: {0:?}")]
    RcptArgDuplicated(String),

    #[error("NOTIFY present but empty")]
    NotifyNotFound,

    #[error("unsupported NOTIFY value: {0:?}")]
    NotifyUnsupported(String),

    #[error("duplicated NOTIFY value: {0:?}")]
    NotifyArgDuplicated(String),

    #[error("bad reply continuation byte: {0:?}")]
    ReplySignBad(char),

    #[error("reply group exceeds the 4096 byte limit")]
    ReplyTooLong,

    #[error("reply codes differ within a group: first={first:?} current={current:?}")]
    ReplyCodesDiffer { first: ReplyCode, current: ReplyCode },

    #[error("reply code could not be parsed: {0:?}")]
    ReplyCodeUnparsable(String),
}

/// Errors surfaced by the connection driver.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The transport is gone and no more specific cause is known.
    #[error("connection closed")]
    ConnectionClosed,

    /// A protocol-level decode/encode failure; fatal, the transport is
    /// closed as a consequence.
    #[error("protocol error: {0}")]
    Codec(#[from] CodecError),

    /// A transport I/O failure; fatal, the transport is closed as a
    /// consequence.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The server replied to a command we trusted completely
    /// (the greeting) with an unexpected code.
    #[error("invalid reply: {} {}", .0.code(), first_line(.0))]
    InvalidReply(Reply),

    /// Composite failure during shutdown: either the server's farewell
    /// reply, the channel close, or both, failed.
    #[error("shutdown failed (server: {}, channel: {})", display_opt(.server), display_opt(.channel))]
    Close {
        server: Option<Box<ConnectionError>>,
        channel: Option<Box<ConnectionError>>,
    },
}

impl Clone for ConnectionError {
    fn clone(&self) -> Self {
        match self {
            ConnectionError::ConnectionClosed => ConnectionError::ConnectionClosed,
            ConnectionError::Codec(e) => ConnectionError::Codec(e.clone()),
            ConnectionError::Io(e) => {
                ConnectionError::Io(std::io::Error::new(e.kind(), e.to_string()))
            }
            ConnectionError::InvalidReply(r) => ConnectionError::InvalidReply(r.clone()),
            ConnectionError::Close { server, channel } => ConnectionError::Close {
                server: server.clone(),
                channel: channel.clone(),
            },
        }
    }
}

fn first_line(reply: &Reply) -> &str {
    reply.message().lines().next().unwrap_or("")
}

fn display_opt(opt: &Option<Box<ConnectionError>>) -> String {
    match opt {
        Some(e) => e.to_string(),
        None => "ok".to_owned(),
    }
}

/// Errors returned by [`crate::Connection::connect`].
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("i/o error connecting to server: {0}")]
    Io(#[from] std::io::Error),

    #[error("tls error: {0}")]
    Tls(#[from] rustls::Error),

    #[error("protocol error reading the greeting: {0}")]
    Codec(#[from] CodecError),

    #[error("connection timed out")]
    Timeout,

    #[error("server greeting was not 220: {0}")]
    InvalidGreeting(Reply),
}
