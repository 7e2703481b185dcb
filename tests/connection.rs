//! Connection-driver integration tests against a loopback server, since
//! `tokio_util::codec` frames a concrete `AsyncRead + AsyncWrite` rather
//! than a hand-rolled mock transport.

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;

use smtp_client::codec::ServerCodec;
use smtp_client::reply::{codes, Reply};
use smtp_client::{Command, ConnectConfig, Connection, Outbound, ServerConfig};

async fn spawn_loopback_server() -> (std::net::SocketAddr, tokio::task::JoinHandle<TcpStream>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        socket
    });
    (addr, handle)
}

#[tokio::test]
async fn close_sends_quit_and_reports_ok_on_221() {
    let (addr, accept) = spawn_loopback_server().await;
    let config = ConnectConfig {
        server: ServerConfig {
            host: addr.ip().to_string(),
            port: addr.port(),
            ..Default::default()
        },
        ..Default::default()
    };

    let client_task = tokio::spawn(async move {
        let connection = Connection::connect(config).await.unwrap();
        let reply = connection
            .send(Outbound::Single(Command::Noop))
            .await
            .unwrap();
        let close_result = connection.close().await;
        (reply, close_result)
    });

    let socket = accept.await.unwrap();
    let mut server = Framed::new(socket, ServerCodec::default());
    server
        .send(Reply::single(codes::READY, "test.local ready"))
        .await
        .unwrap();

    let noop = server.next().await.unwrap().unwrap();
    assert_eq!(noop, Command::Noop);
    server.send(Reply::single(codes::OK, "OK")).await.unwrap();

    let quit = server.next().await.unwrap().unwrap();
    assert_eq!(quit, Command::Quit);
    server
        .send(Reply::single(codes::CLOSING_CHANNEL, "bye"))
        .await
        .unwrap();

    let (reply, close_result) = client_task.await.unwrap();
    assert_eq!(reply.code(), codes::OK);
    assert!(close_result.is_ok());
}

#[tokio::test]
async fn invalid_greeting_fails_connect() {
    let (addr, accept) = spawn_loopback_server().await;
    let config = ConnectConfig {
        server: ServerConfig {
            host: addr.ip().to_string(),
            port: addr.port(),
            ..Default::default()
        },
        ..Default::default()
    };

    let client_task = tokio::spawn(async move { Connection::connect(config).await });

    let socket = accept.await.unwrap();
    let mut server = Framed::new(socket, ServerCodec::default());
    server
        .send(Reply::single(codes::OK, "not a greeting"))
        .await
        .unwrap();

    let result = client_task.await.unwrap();
    assert!(result.is_err());
}

#[tokio::test]
async fn server_disconnect_cascades_to_pending_send() {
    let (addr, accept) = spawn_loopback_server().await;
    let config = ConnectConfig {
        server: ServerConfig {
            host: addr.ip().to_string(),
            port: addr.port(),
            ..Default::default()
        },
        ..Default::default()
    };

    let client_task = tokio::spawn(async move {
        let connection = Connection::connect(config).await.unwrap();
        let result = connection.send(Outbound::Single(Command::Noop)).await;
        (connection.is_connected(), result)
    });

    let socket = accept.await.unwrap();
    let mut server = Framed::new(socket, ServerCodec::default());
    server
        .send(Reply::single(codes::READY, "test.local ready"))
        .await
        .unwrap();
    let _ = server.next().await.unwrap().unwrap();
    drop(server);

    let (was_connected_at_read, result) = client_task.await.unwrap();
    assert!(!was_connected_at_read || result.is_err());
    assert!(result.is_err());
}

#[tokio::test]
async fn replies_resolve_pipelined_sends_in_fifo_order() {
    let (addr, accept) = spawn_loopback_server().await;
    let config = ConnectConfig {
        server: ServerConfig {
            host: addr.ip().to_string(),
            port: addr.port(),
            ..Default::default()
        },
        ..Default::default()
    };

    let client_task = tokio::spawn(async move {
        let connection = Connection::connect(config).await.unwrap();
        let first = connection.send(Outbound::Single(Command::Noop));
        let second = connection.send(Outbound::Single(Command::Rset));
        tokio::join!(first, second)
    });

    let socket = accept.await.unwrap();
    let mut server = Framed::new(socket, ServerCodec::default());
    server
        .send(Reply::single(codes::READY, "test.local ready"))
        .await
        .unwrap();

    let first_command = server.next().await.unwrap().unwrap();
    assert_eq!(first_command, Command::Noop);
    let second_command = server.next().await.unwrap().unwrap();
    assert_eq!(second_command, Command::Rset);

    server
        .send(Reply::single(codes::OK, "first"))
        .await
        .unwrap();
    server
        .send(Reply::single(codes::OK, "second"))
        .await
        .unwrap();

    let (first_reply, second_reply) = client_task.await.unwrap();
    assert_eq!(first_reply.unwrap().message(), "first\r\n");
    assert_eq!(second_reply.unwrap().message(), "second\r\n");
}
