//! Transport binding (component C6): plain or TLS bootstrap of the socket
//! that the connection driver then owns.

use std::net::ToSocketAddrs;
use std::sync::Arc;

use socket2::Socket;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::TlsConnector;
use tracing::{debug, instrument};

use crate::config::{ConnectConfig, Security};
use crate::connection::Connection;
use crate::error::ConnectError;

/// Connects a plain TCP socket with `SO_REUSEADDR` and `TCP_NODELAY` set,
/// as required of every transport binding regardless of security mode.
async fn connect_tcp(host: &str, port: u16) -> std::io::Result<TcpStream> {
    let addr = (host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "no address resolved"))?;
    let std_stream = tokio::task::spawn_blocking(move || std::net::TcpStream::connect(addr))
        .await
        .expect("connect task panicked")?;

    let socket = Socket::from(std_stream);
    socket.set_reuse_address(true)?;
    socket.set_nodelay(true)?;
    socket.set_nonblocking(true)?;
    TcpStream::from_std(socket.into())
}

/// Connects to the server described by `config`, waits for its greeting,
/// and returns a live [`Connection`].
#[instrument(skip(config), fields(host = %config.server.host, port = config.server.port))]
pub async fn connect(config: ConnectConfig) -> Result<Connection, ConnectError> {
    let ConnectConfig { security, server } = config;

    let tcp = timeout(server.timeout, connect_tcp(&server.host, server.port))
        .await
        .map_err(|_| ConnectError::Timeout)??;
    debug!("tcp connected, SO_REUSEADDR and TCP_NODELAY set");

    match security {
        Security::Plain => Connection::handshake(tcp).await,
        Security::Tls { sni, client_config } => {
            let client_config = client_config.unwrap_or_else(|| Arc::new(default_tls_config()));
            let connector = TlsConnector::from(client_config);

            let name = sni.unwrap_or_else(|| server.host.clone());
            let server_name = ServerName::try_from(name)
                .map_err(|e| ConnectError::Tls(tokio_rustls::rustls::Error::General(e.to_string())))?;

            let tls_stream = timeout(server.timeout, connector.connect(server_name, tcp))
                .await
                .map_err(|_| ConnectError::Timeout)??;

            Connection::handshake(tls_stream).await
        }
    }
}

fn default_tls_config() -> tokio_rustls::rustls::ClientConfig {
    let mut roots = tokio_rustls::rustls::RootCertStore::empty();
    for cert in rustls_native_certs::load_native_certs().certs {
        let _ = roots.add(cert);
    }
    tokio_rustls::rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth()
}
