//! Frame adapters wrapping the command and reply codecs for incremental,
//! `tokio_util::codec`-compatible streams (component C4).
//!
//! Each decoder saves nothing across calls beyond what `BytesMut` already
//! retains: on *incomplete* it returns `Ok(None)` without consuming
//! anything, so the next `decode` call sees the same bytes plus whatever
//! arrived since.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::command::{self, Command};
use crate::error::CodecError;
use crate::outbound::Outbound;
use crate::reply::{self, Reply};

/// Decodes a stream of server replies.
#[derive(Debug, Default)]
pub struct ReplyDecoder;

impl Decoder for ReplyDecoder {
    type Item = Reply;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Reply>, CodecError> {
        match reply::decode_reply(src)? {
            Some((consumed, reply)) => {
                src.advance(consumed);
                Ok(Some(reply))
            }
            None => Ok(None),
        }
    }
}

/// Decodes a stream of client commands. Used by the loopback test harness
/// playing the server role; the connection driver itself only ever
/// encodes commands.
#[derive(Debug, Default)]
pub struct CommandDecoder;

impl Decoder for CommandDecoder {
    type Item = Command;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Command>, CodecError> {
        match command::decode_command(src)? {
            Some((consumed, command)) => {
                src.advance(consumed);
                Ok(Some(command))
            }
            None => Ok(None),
        }
    }
}

/// Encodes outbound writes: a single command, each command of a pipelined
/// bulk in order, or a raw byte passthrough.
#[derive(Debug, Default)]
pub struct CommandEncoder;

impl Encoder<Outbound> for CommandEncoder {
    type Error = CodecError;

    fn encode(&mut self, item: Outbound, dst: &mut BytesMut) -> Result<(), CodecError> {
        match item {
            Outbound::Single(command) => {
                let mut buf = Vec::new();
                command::encode_command(&command, &mut buf);
                dst.extend_from_slice(&buf);
            }
            Outbound::Bulk(commands) => {
                let mut buf = Vec::new();
                for command in &commands {
                    command::encode_command(command, &mut buf);
                }
                dst.extend_from_slice(&buf);
            }
            Outbound::Raw(bytes) => dst.extend_from_slice(&bytes),
        }
        Ok(())
    }
}

/// Encodes server replies. Used by the loopback test harness.
#[derive(Debug, Default)]
pub struct ReplyEncoder;

impl Encoder<Reply> for ReplyEncoder {
    type Error = CodecError;

    fn encode(&mut self, item: Reply, dst: &mut BytesMut) -> Result<(), CodecError> {
        let mut buf = Vec::new();
        reply::encode_reply(&item, &mut buf);
        dst.extend_from_slice(&buf);
        Ok(())
    }
}

/// The codec the connection driver frames its side of the wire with:
/// decodes server replies, encodes outbound writes. Combines
/// [`ReplyDecoder`] and [`CommandEncoder`] so a single `Framed` can do both.
#[derive(Debug, Default)]
pub struct ConnectionCodec {
    replies: ReplyDecoder,
    commands: CommandEncoder,
}

impl Decoder for ConnectionCodec {
    type Item = Reply;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Reply>, CodecError> {
        self.replies.decode(src)
    }
}

impl Encoder<Outbound> for ConnectionCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Outbound, dst: &mut BytesMut) -> Result<(), CodecError> {
        self.commands.encode(item, dst)
    }
}

/// The mirror image of [`ConnectionCodec`], for a test harness playing the
/// server role: decodes commands, encodes replies.
#[derive(Debug, Default)]
pub struct ServerCodec {
    commands: CommandDecoder,
    replies: ReplyEncoder,
}

impl Decoder for ServerCodec {
    type Item = Command;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Command>, CodecError> {
        self.commands.decode(src)
    }
}

impl Encoder<Reply> for ServerCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Reply, dst: &mut BytesMut) -> Result<(), CodecError> {
        self.replies.encode(item, dst)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn reply_decoder_yields_nothing_until_terminator_arrives() {
        let mut decoder = ReplyDecoder;
        let mut buf = BytesMut::from(&b"221-a\r\n"[..]);
        assert_eq!(decoder.decode(&mut buf).unwrap(), None);
        assert_eq!(buf.len(), 7, "incomplete decode must not consume bytes");

        buf.extend_from_slice(b"221 b\r\n");
        let reply = decoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(reply.message(), "a\r\nb\r\n");
        assert!(buf.is_empty());
    }

    #[test]
    fn command_encoder_handles_bulk() {
        let mut encoder = CommandEncoder;
        let mut buf = BytesMut::new();
        encoder
            .encode(Outbound::Bulk(vec![Command::Noop, Command::Quit]), &mut buf)
            .unwrap();
        assert_eq!(&buf[..], b"NOOP\r\nQUIT\r\n");
    }

    #[test]
    fn command_encoder_handles_raw() {
        let mut encoder = CommandEncoder;
        let mut buf = BytesMut::new();
        encoder
            .encode(Outbound::Raw(bytes::Bytes::from_static(b"X\r\n.\r\n")), &mut buf)
            .unwrap();
        assert_eq!(&buf[..], b"X\r\n.\r\n");
    }
}
