//! Client-side SMTP: wire codec and connection driver.
//!
//! The public surface is small on purpose: [`transport::connect`] (aliased
//! as [`Connection::connect`]) bootstraps a socket and returns a
//! [`Connection`]; [`Connection::send`] submits an [`Outbound`] and
//! resolves to the matching [`Reply`]; [`Connection::close`] drives an
//! orderly `QUIT` shutdown.

pub mod address;
pub mod ascii;
pub mod codec;
pub mod command;
pub mod config;
pub mod connection;
pub mod error;
pub mod outbound;
pub mod reply;
pub mod transport;

pub use address::{Address, ClientIdentity};
pub use command::Command;
pub use config::{ConnectConfig, Security, ServerConfig};
pub use connection::Connection;
pub use error::{CodecError, ConnectError, ConnectionError};
pub use outbound::Outbound;
pub use reply::{Reply, ReplyCode};

impl Connection {
    /// Connects to the server described by `config` and waits for its
    /// greeting. Thin alias over [`transport::connect`] so callers reach
    /// for `Connection::connect` the way the runtime surface documents it.
    pub async fn connect(config: ConnectConfig) -> Result<Connection, ConnectError> {
        transport::connect(config).await
    }
}
