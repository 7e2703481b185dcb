//! Connection configuration.

use std::sync::Arc;
use std::time::Duration;

/// The transport-layer security a connection should use.
#[derive(Debug, Clone)]
pub enum Security {
    Plain,
    Tls {
        /// SNI name; defaults to [`ServerConfig::host`] when absent.
        sni: Option<String>,
        /// Client TLS config; defaults to the platform's native roots
        /// (via `rustls-native-certs`) when absent.
        client_config: Option<Arc<rustls::ClientConfig>>,
    },
}

impl Default for Security {
    fn default() -> Self {
        Security::Plain
    }
}

/// Where to connect.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_owned(),
            port: 25,
            timeout: Duration::from_secs(10),
        }
    }
}

/// Top-level configuration for [`crate::Connection::connect`].
#[derive(Debug, Clone, Default)]
pub struct ConnectConfig {
    pub security: Security,
    pub server: ServerConfig,
}
