//! Client connection: one duplex stream to one peer
//!
//! `connect` opens the stream and spawns a receive task that owns the read
//! half and the frame reader. Decoded payloads are pushed, in stream order,
//! onto a per-link channel returned by `connect`; the channel ends with exactly
//! one [`NetEvent::Closed`] whether the link was closed remotely, locally, or by
//! an I/O error.
//!
//! Sends go through a per-link async mutex around the write half. The receive
//! task never takes that lock, so a stalled peer cannot hold up local input
//! behind a blocked read.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::error::NetError;
use crate::framing::{write_frame, FrameReader, DEFAULT_MAX_FRAME};
use crate::wire_log::{Direction, WireLog};
use net_tetris_types::ConnectionState;

/// Event delivered by the receive task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetEvent {
    /// One complete payload
    Message(String),
    /// The link is gone; nothing follows
    Closed,
}

struct Link {
    peer: SocketAddr,
    writer: Arc<tokio::sync::Mutex<Option<OwnedWriteHalf>>>,
    closed: Arc<AtomicBool>,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Connection handle. All methods take `&self`; share it behind an `Arc`.
pub struct Connection {
    max_frame: usize,
    wire_log: Option<WireLog>,
    state: Arc<watch::Sender<ConnectionState>>,
    link: Mutex<Option<Link>>,
    /// Held across `connect` so a retired link's task is always joined
    /// before the next link reports `Connected`.
    connecting: tokio::sync::Mutex<()>,
}

impl Default for Connection {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME, None)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("state", &self.state())
            .field("peer", &self.peer_addr())
            .finish()
    }
}

impl Connection {
    pub fn new(max_frame: usize, wire_log: Option<WireLog>) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            max_frame,
            wire_log,
            state: Arc::new(state),
            link: Mutex::new(None),
            connecting: tokio::sync::Mutex::new(()),
        }
    }

    fn lock_link(&self) -> MutexGuard<'_, Option<Link>> {
        self.link.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Watch state transitions
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.lock_link().as_ref().map(|link| link.peer)
    }

    /// Open a stream to `host:port` and start the receive task.
    ///
    /// An existing link is disconnected first. Concurrent calls run one after
    /// another; the last one to run owns the connection. Returns the receiver
    /// for the new link's events.
    pub async fn connect(
        &self,
        host: &str,
        port: u16,
    ) -> Result<mpsc::UnboundedReceiver<NetEvent>, NetError> {
        let _connecting = self.connecting.lock().await;
        self.disconnect().await;

        let addr = format!("{}:{}", host, port);
        self.state.send_replace(ConnectionState::Connecting);

        let (stream, peer) = match open_stream(&addr).await {
            Ok(opened) => opened,
            Err(source) => {
                self.state.send_replace(ConnectionState::Disconnected);
                warn!("[Net] connect to {} failed: {}", addr, source);
                return Err(NetError::Connect { addr, source });
            }
        };

        let (read_half, write_half) = stream.into_split();
        let writer = Arc::new(tokio::sync::Mutex::new(Some(write_half)));
        let closed = Arc::new(AtomicBool::new(false));
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        self.state.send_replace(ConnectionState::Connected);
        info!("[Net] connected to {}", peer);

        let receiver = ReceiveLoop {
            reader: FrameReader::with_max_frame(read_half, self.max_frame),
            writer: Arc::clone(&writer),
            closed: Arc::clone(&closed),
            events: events_tx,
            shutdown: shutdown_rx,
            state: Arc::clone(&self.state),
            peer,
            wire_log: self.wire_log.clone(),
        };
        let task = tokio::spawn(receiver.run());

        let link = Link {
            peer,
            writer,
            closed,
            shutdown: shutdown_tx,
            task,
        };
        *self.lock_link() = Some(link);

        Ok(events_rx)
    }

    /// Frame and send one payload.
    ///
    /// Fails with `NotConnected` if no stream was ever opened (or after a
    /// local disconnect) and with `StreamClosed` once the stream has gone away.
    pub async fn send(&self, payload: &str) -> Result<(), NetError> {
        let (writer, closed, peer) = {
            let guard = self.lock_link();
            let link = guard.as_ref().ok_or(NetError::NotConnected)?;
            (Arc::clone(&link.writer), Arc::clone(&link.closed), link.peer)
        };

        if closed.load(Ordering::Acquire) {
            return Err(NetError::StreamClosed);
        }

        let mut slot = writer.lock().await;
        let Some(half) = slot.as_mut() else {
            return Err(NetError::StreamClosed);
        };
        if let Err(e) = write_frame(half, payload).await {
            warn!("[Net] send to {} failed: {}", peer, e);
            closed.store(true, Ordering::Release);
            *slot = None;
            return Err(NetError::StreamClosed);
        }
        drop(slot);

        debug!("[Net] -> {} {:?}", peer, payload);
        if let Some(log) = self.wire_log.as_ref() {
            log.record(Direction::Out, peer.to_string(), payload);
        }
        Ok(())
    }

    /// Close the stream and wait for the receive task to finish. Idempotent.
    pub async fn disconnect(&self) {
        let link = self.lock_link().take();
        let Some(link) = link else {
            return;
        };

        info!("[Net] disconnecting from {}", link.peer);
        let _ = link.shutdown.send(());
        if let Err(e) = link.task.await {
            warn!("[Net] receive task for {} ended abnormally: {}", link.peer, e);
        }
        self.state.send_replace(ConnectionState::Disconnected);
    }
}

async fn open_stream(addr: &str) -> std::io::Result<(TcpStream, SocketAddr)> {
    let stream = TcpStream::connect(addr).await?;
    stream.set_nodelay(true)?;
    let peer = stream.peer_addr()?;
    Ok((stream, peer))
}

/// Receive task state. Sole owner of the read half.
struct ReceiveLoop {
    reader: FrameReader<OwnedReadHalf>,
    writer: Arc<tokio::sync::Mutex<Option<OwnedWriteHalf>>>,
    closed: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<NetEvent>,
    shutdown: oneshot::Receiver<()>,
    state: Arc<watch::Sender<ConnectionState>>,
    peer: SocketAddr,
    wire_log: Option<WireLog>,
}

impl ReceiveLoop {
    async fn run(mut self) {
        loop {
            tokio::select! {
                _ = &mut self.shutdown => {
                    debug!("[Net] receive loop for {} stopped locally", self.peer);
                    break;
                }
                frame = self.reader.next_frame() => match frame {
                    Ok(Some(payload)) => {
                        debug!("[Net] <- {} {} bytes", self.peer, payload.len());
                        if let Some(log) = self.wire_log.as_ref() {
                            log.record(Direction::In, self.peer.to_string(), &payload);
                        }
                        if self.events.send(NetEvent::Message(payload)).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        info!("[Net] {} closed the connection", self.peer);
                        break;
                    }
                    Err(e) => {
                        warn!("[Net] connection to {} lost: {}", self.peer, e);
                        break;
                    }
                },
            }
        }

        self.closed.store(true, Ordering::Release);
        // Drop the write half unless a send is mid-flight; that send fails
        // on its own and the flag stops the next one.
        if let Ok(mut slot) = self.writer.try_lock() {
            *slot = None;
        }
        self.state.send_replace(ConnectionState::Disconnected);
        let _ = self.events.send(NetEvent::Closed);
    }
}
