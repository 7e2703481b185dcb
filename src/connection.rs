//! The connection driver (component C5): a single spawned task owning the
//! framed transport and the FIFO reply-promise queue, talked to over an
//! `mpsc` channel from the public [`Connection`] handle.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::codec::Framed;
use tracing::{debug, error, info, warn};

use crate::codec::ConnectionCodec;
use crate::error::{ConnectError, ConnectionError};
use crate::outbound::Outbound;
use crate::reply::{codes, Reply};

const STATE_OPEN: u8 = 0;
const STATE_SHUTTING_DOWN: u8 = 1;
const STATE_CLOSED: u8 = 2;

/// The channel capacity of a connection's request queue. Pipelining
/// beyond this depth simply backpressures the caller.
const CHANNEL_CAPACITY: usize = 64;

enum DriverMessage {
    Write(Outbound, oneshot::Sender<Result<Reply, ConnectionError>>),
    Close(oneshot::Sender<Result<(), ConnectionError>>),
}

enum PendingEntry {
    Normal(oneshot::Sender<Result<Reply, ConnectionError>>),
    Quit(oneshot::Sender<Result<(), ConnectionError>>),
}

/// A live SMTP connection.
///
/// Cheap to hold: internally it is a channel handle plus a lock-free state
/// probe. The actual socket and the reply-promise queue live exclusively on
/// the spawned driver task.
pub struct Connection {
    tx: mpsc::Sender<DriverMessage>,
    state: Arc<AtomicU8>,
    closed_rx: watch::Receiver<bool>,
}

impl Connection {
    /// Wires a driver task around an already-established transport and
    /// waits for the server's greeting.
    pub(crate) async fn handshake<T>(transport: T) -> Result<Connection, ConnectError>
    where
        T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let mut framed = Framed::new(transport, ConnectionCodec::default());

        let greeting = framed
            .next()
            .await
            .ok_or_else(|| ConnectError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "transport closed before sending a greeting",
            )))??;

        if greeting.code() != codes::READY {
            return Err(ConnectError::InvalidGreeting(greeting));
        }
        debug!(code = %greeting.code(), "received greeting");

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let state = Arc::new(AtomicU8::new(STATE_OPEN));
        let (closed_tx, closed_rx) = watch::channel(false);

        tokio::spawn(drive(framed, rx, Arc::clone(&state), closed_tx));

        Ok(Connection {
            tx,
            state,
            closed_rx,
        })
    }

    /// Sends `outbound` and resolves once the matching reply arrives, in
    /// strict FIFO order with every other outstanding send on this
    /// connection.
    pub async fn send(&self, outbound: Outbound) -> Result<Reply, ConnectionError> {
        let (tx, rx) = oneshot::channel();
        self.tx
            .send(DriverMessage::Write(outbound, tx))
            .await
            .map_err(|_| ConnectionError::ConnectionClosed)?;
        rx.await.unwrap_or(Err(ConnectionError::ConnectionClosed))
    }

    /// Issues `QUIT`, closes the transport regardless of the server's
    /// reply, and resolves once both have been accounted for.
    pub async fn close(self) -> Result<(), ConnectionError> {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(DriverMessage::Close(tx)).await.is_err() {
            // Driver already gone; treat as a successful close, per the
            // "already-closed channel reported during shutdown" rule.
            return Ok(());
        }
        rx.await.unwrap_or(Ok(()))
    }

    /// Reads the connection's lifecycle state without a round trip to the
    /// driver task.
    pub fn is_connected(&self) -> bool {
        self.state.load(Ordering::SeqCst) == STATE_OPEN
    }

    /// Resolves once the driver has torn down, however that happened.
    pub async fn closed(&self) {
        let mut rx = self.closed_rx.clone();
        let _ = rx.wait_for(|done| *done).await;
    }
}

async fn drive<T>(
    mut framed: Framed<T, ConnectionCodec>,
    mut rx: mpsc::Receiver<DriverMessage>,
    state: Arc<AtomicU8>,
    closed_tx: watch::Sender<bool>,
) where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    let mut pending: VecDeque<PendingEntry> = VecDeque::new();
    let mut terminal: Option<ConnectionError> = None;

    'main: loop {
        tokio::select! {
            message = rx.recv() => {
                match message {
                    None => {
                        terminal = Some(cascade(&mut pending, ConnectionError::ConnectionClosed));
                        break 'main;
                    }
                    Some(DriverMessage::Write(outbound, reply_tx)) => {
                        if state.load(Ordering::SeqCst) != STATE_OPEN {
                            let err = terminal.clone().unwrap_or(ConnectionError::ConnectionClosed);
                            let _ = reply_tx.send(Err(err));
                            continue;
                        }
                        pending.push_back(PendingEntry::Normal(reply_tx));
                        if let Err(e) = framed.send(outbound).await {
                            // Write failed: pull our own promise back out so
                            // the cascade below does not fail it twice.
                            if let Some(PendingEntry::Normal(failed)) = pending.pop_back() {
                                let _ = failed.send(Err(ConnectionError::Codec(e.clone())));
                            }
                            terminal = Some(cascade(&mut pending, ConnectionError::Codec(e)));
                            break 'main;
                        }
                    }
                    Some(DriverMessage::Close(done_tx)) => {
                        let current = state.load(Ordering::SeqCst);
                        if current == STATE_SHUTTING_DOWN {
                            // A shutdown is already in flight (the FIFO
                            // entry for it is already queued); this second
                            // caller gets an immediate answer instead of
                            // waiting on someone else's QUIT.
                            let result = terminal.clone().map(Err).unwrap_or(Ok(()));
                            let _ = done_tx.send(result);
                            continue;
                        }
                        state.store(STATE_SHUTTING_DOWN, Ordering::SeqCst);
                        pending.push_back(PendingEntry::Quit(done_tx));
                        if let Err(e) = framed.send(Outbound::Single(crate::command::Command::Quit)).await {
                            if let Some(PendingEntry::Quit(done_tx)) = pending.pop_back() {
                                let _ = done_tx.send(Err(ConnectionError::Codec(e.clone())));
                            }
                            terminal = Some(cascade(&mut pending, ConnectionError::Codec(e)));
                            break 'main;
                        }
                    }
                }
            }
            frame = framed.next() => {
                match frame {
                    Some(Ok(reply)) => {
                        match pending.pop_front() {
                            Some(PendingEntry::Normal(reply_tx)) => {
                                let _ = reply_tx.send(Ok(reply));
                            }
                            Some(PendingEntry::Quit(done_tx)) => {
                                let result = if reply.code() == codes::CLOSING_CHANNEL {
                                    Ok(())
                                } else {
                                    Err(ConnectionError::InvalidReply(reply))
                                };
                                let _ = done_tx.send(result);
                                break 'main;
                            }
                            None => {
                                error!("reply arrived with no pending request; protocol order violation");
                                terminal = Some(cascade(&mut pending, ConnectionError::ConnectionClosed));
                                break 'main;
                            }
                        }
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "decode error, cascading failure to all pending requests");
                        terminal = Some(cascade(&mut pending, ConnectionError::Codec(e)));
                        break 'main;
                    }
                    None => {
                        terminal = Some(cascade(&mut pending, ConnectionError::ConnectionClosed));
                        break 'main;
                    }
                }
            }
        }
    }

    state.store(STATE_CLOSED, Ordering::SeqCst);
    info!("connection closed");
    let _ = closed_tx.send(true);
}

/// Fails every pending promise with `cause` and returns it so the caller
/// can remember it as the connection's terminal error.
fn cascade(pending: &mut VecDeque<PendingEntry>, cause: ConnectionError) -> ConnectionError {
    while let Some(entry) = pending.pop_front() {
        match entry {
            PendingEntry::Normal(tx) => {
                let _ = tx.send(Err(cause.clone()));
            }
            PendingEntry::Quit(tx) => {
                let _ = tx.send(Err(cause.clone()));
            }
        }
    }
    cause
}
