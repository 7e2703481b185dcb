//! The shape of a single write to the connection.

use bytes::Bytes;

use crate::command::Command;

/// What a caller hands to [`crate::Connection::send`]: one command, a
/// pipelined run of commands, or a raw byte blob (used for the `DATA`
/// payload and for tests).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Single(Command),
    Bulk(Vec<Command>),
    Raw(Bytes),
}

impl From<Command> for Outbound {
    fn from(command: Command) -> Self {
        Outbound::Single(command)
    }
}
