//! Game client: a connection plus the local prediction state
//!
//! The prediction `GameSession` sits behind a single mutex. Local commands are
//! predicted under that lock and then sent outside it; received snapshots
//! replace the board under the same lock. The two can never interleave, and a
//! slow send never holds the session.
//!
//! Everything observable is pushed as a [`ClientEvent`] on the channel
//! returned by [`GameClient::new`].

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::ClientConfig;
use crate::connection::{Connection, NetEvent};
use crate::error::NetError;
use crate::protocol::{classify, command_payload, InboundMessage};
use crate::wire_log::WireLog;
use net_tetris_core::{Board, GameEvent, GameSession, SessionConfig, SimpleRng, Tetromino};
use net_tetris_types::{Command, ConnectionState};

/// Notification pushed to the client's owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Connected { peer: SocketAddr },
    Disconnected,
    Game(GameEvent),
    RemoteGameOver,
    Unrecognized(String),
}

pub struct GameClient {
    connection: Arc<Connection>,
    session: Arc<Mutex<GameSession>>,
    events: mpsc::UnboundedSender<ClientEvent>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

fn lock_session(session: &Mutex<GameSession>) -> MutexGuard<'_, GameSession> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

fn forward(events: &mpsc::UnboundedSender<ClientEvent>, game_events: Vec<GameEvent>) {
    for event in game_events {
        let _ = events.send(ClientEvent::Game(event));
    }
}

/// Apply one received payload to the prediction state
fn apply_inbound(
    session: &Mutex<GameSession>,
    events: &mpsc::UnboundedSender<ClientEvent>,
    payload: String,
) {
    match classify(payload) {
        InboundMessage::Snapshot(board) => {
            let game_events = {
                let mut session = lock_session(session);
                session.replace_board(board);
                session.take_events()
            };
            forward(events, game_events);
        }
        InboundMessage::GameOver => {
            info!("[Net] server reported game over");
            let _ = events.send(ClientEvent::RemoteGameOver);
        }
        InboundMessage::Unrecognized(payload) => {
            warn!("[Net] ignoring unrecognized payload ({} bytes)", payload.len());
            let _ = events.send(ClientEvent::Unrecognized(payload));
        }
    }
}

impl GameClient {
    pub fn new(
        config: &ClientConfig,
        wire_log: Option<WireLog>,
    ) -> (Self, mpsc::UnboundedReceiver<ClientEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let session = GameSession::new(
            Box::new(SimpleRng::from_entropy()),
            SessionConfig::default(),
        );
        let client = Self {
            connection: Arc::new(Connection::new(config.max_frame, wire_log)),
            session: Arc::new(Mutex::new(session)),
            events,
            pump: Mutex::new(None),
        };
        (client, events_rx)
    }

    /// Connect and start forwarding received messages.
    ///
    /// The prediction state is reset; the board is filled in by the server's
    /// first snapshot. An existing link is closed first.
    pub async fn connect(&self, host: &str, port: u16) -> Result<(), NetError> {
        self.disconnect().await;

        let mut net_rx = self.connection.connect(host, port).await?;

        let game_events = {
            let mut session = lock_session(&self.session);
            session.reset();
            session.take_events()
        };
        if let Some(peer) = self.connection.peer_addr() {
            let _ = self.events.send(ClientEvent::Connected { peer });
        }
        forward(&self.events, game_events);

        let session = Arc::clone(&self.session);
        let events = self.events.clone();
        let pump = tokio::spawn(async move {
            while let Some(event) = net_rx.recv().await {
                match event {
                    NetEvent::Message(payload) => apply_inbound(&session, &events, payload),
                    NetEvent::Closed => {
                        let _ = events.send(ClientEvent::Disconnected);
                        break;
                    }
                }
            }
        });
        *self.pump.lock().unwrap_or_else(PoisonError::into_inner) = Some(pump);
        Ok(())
    }

    /// Predict `command` locally, then send it.
    ///
    /// Returns whether the local prediction accepted the move. The command is
    /// sent either way; the server is the authority. After [`connect`] the
    /// prediction state holds no falling piece (the server's snapshots carry
    /// it), so online this is `false` unless the caller spawned one through
    /// [`with_session`].
    ///
    /// [`connect`]: GameClient::connect
    /// [`with_session`]: GameClient::with_session
    pub async fn send_command(&self, command: Command) -> Result<bool, NetError> {
        let (accepted, game_events) = {
            let mut session = lock_session(&self.session);
            let accepted = session.predict_command(command);
            (accepted, session.take_events())
        };
        forward(&self.events, game_events);

        self.connection.send(command_payload(command)).await?;
        Ok(accepted)
    }

    /// Close the link and wait until `Disconnected` has been queued. Idempotent.
    pub async fn disconnect(&self) {
        self.connection.disconnect().await;
        let pump = self
            .pump
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(pump) = pump {
            let _ = pump.await;
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Clone of the current locked cells
    pub fn board(&self) -> Board {
        lock_session(&self.session).board().clone()
    }

    /// Locally predicted falling piece, if any
    pub fn active_piece(&self) -> Option<Tetromino> {
        lock_session(&self.session).active().cloned()
    }

    /// Run `f` with the prediction state locked
    pub fn with_session<R>(&self, f: impl FnOnce(&mut GameSession) -> R) -> R {
        f(&mut lock_session(&self.session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use net_tetris_core::encode_board;
    use net_tetris_types::Cell;

    #[test]
    fn test_snapshot_replaces_board() {
        let session = Mutex::new(GameSession::with_seed(1));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut board = Board::new();
        board.set(19, 9, Cell::Filled).unwrap();
        apply_inbound(&session, &tx, encode_board(&board));

        assert_eq!(lock_session(&session).board(), &board);
        assert_eq!(
            rx.try_recv().unwrap(),
            ClientEvent::Game(GameEvent::BoardUpdated(board))
        );
    }

    #[test]
    fn test_control_and_unknown_payloads() {
        let session = Mutex::new(GameSession::with_seed(1));
        let (tx, mut rx) = mpsc::unbounded_channel();

        apply_inbound(&session, &tx, "game_over".to_string());
        apply_inbound(&session, &tx, "hello".to_string());

        assert_eq!(rx.try_recv().unwrap(), ClientEvent::RemoteGameOver);
        assert_eq!(
            rx.try_recv().unwrap(),
            ClientEvent::Unrecognized("hello".to_string())
        );
        assert!(lock_session(&session).board().is_empty());
    }

    #[tokio::test]
    async fn test_send_command_requires_connection() {
        let (client, _rx) = GameClient::new(&ClientConfig::default(), None);
        assert!(matches!(
            client.send_command(Command::Rotate).await,
            Err(NetError::NotConnected)
        ));
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }
}
