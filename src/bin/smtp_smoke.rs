//! Smoke test: connect to a local server, issue `NOOP`, close.
//!
//! Not part of the core library; a runnable demonstration in the spirit of
//! a README example, relocated to a binary target here.

use smtp_client::{Command, ConnectConfig, Connection, Outbound};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = ConnectConfig {
        server: smtp_client::ServerConfig {
            host: "127.0.0.1".to_owned(),
            port: 2525,
            ..Default::default()
        },
        ..Default::default()
    };

    if let Err(e) = run(config).await {
        eprintln!("smoke test failed: {e}");
        std::process::exit(1);
    }
}

async fn run(config: ConnectConfig) -> Result<(), Box<dyn std::error::Error>> {
    let connection = Connection::connect(config).await?;
    let reply = connection.send(Outbound::Single(Command::Noop)).await?;
    println!("NOOP -> {} {}", reply.code(), reply.message().trim_end());
    connection.close().await?;
    Ok(())
}
