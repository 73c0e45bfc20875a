//! Reference game server
//!
//! Accepts any number of clients and gives each its own authoritative
//! [`GameSession`]. The server sends the composed board (locked cells plus the
//! falling piece) right after accepting, after every recognized command, and
//! whenever gravity moves the piece. Unknown commands are logged and ignored.
//! When the session ends it sends `game_over` and closes the connection.
//!
//! Outbound frames go through a per-client writer task fed by a channel, so the
//! session loop never waits on a slow socket.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use anyhow::Result;
use log::{debug, info, warn};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};

use crate::config::ServerConfig;
use crate::framing::{write_frame, FrameReader};
use crate::protocol::parse_command;
use crate::wire_log::{Direction, WireLog};
use net_tetris_core::{encode_board, GameEvent, GameSession, SessionConfig, SimpleRng};
use net_tetris_types::GAME_OVER_MESSAGE;

/// Session clock resolution
const TICK_MS: u64 = 100;

fn new_session(config: &ServerConfig) -> GameSession {
    let pieces = match config.seed {
        Some(seed) => SimpleRng::new(seed),
        None => SimpleRng::from_entropy(),
    };
    GameSession::new(
        Box::new(pieces),
        SessionConfig {
            duration_secs: config.session_secs,
            gravity: config.gravity,
        },
    )
}

/// Start the TCP server.
///
/// The bound address is reported through `ready_tx` once listening, which
/// lets callers bind port 0.
pub async fn run_server(
    config: ServerConfig,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> Result<()> {
    let wire_log = config.log_path.clone().map(WireLog::spawn);

    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    let bound = listener.local_addr()?;
    info!("[Server] listening on {}", bound);
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let mut client_id_counter = 0usize;

    // Accept incoming connections
    loop {
        let (socket, peer) = listener.accept().await?;
        client_id_counter += 1;
        let client_id = client_id_counter;

        info!("[Server] client {} connected from {}", client_id, peer);

        let config = config.clone();
        let wire_log = wire_log.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, peer, client_id, config, wire_log).await {
                warn!("[Server] client {} error: {}", client_id, e);
            }
            info!("[Server] client {} disconnected", client_id);
        });
    }
}

/// Queue the composed board for the writer task
fn send_snapshot(session: &GameSession, tx: &mpsc::UnboundedSender<String>) {
    let _ = tx.send(encode_board(&session.composed_board()));
}

/// Run one client's session until it disconnects or the game ends
async fn handle_client(
    socket: TcpStream,
    peer: SocketAddr,
    client_id: usize,
    config: ServerConfig,
    wire_log: Option<WireLog>,
) -> Result<()> {
    socket.set_nodelay(true)?;
    let (reader, mut writer) = socket.into_split();

    // Channel to send payloads to this client
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let wire_log_out = wire_log.clone();
    let write_task = tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            if write_frame(&mut writer, &payload).await.is_err() {
                break;
            }
            if let Some(log) = wire_log_out.as_ref() {
                log.record(Direction::Out, peer.to_string(), &payload);
            }
        }
        let _ = writer.shutdown().await;
    });

    let mut session = new_session(&config);
    session.start();
    session.take_events();
    send_snapshot(&session, &tx);

    let mut frames = FrameReader::with_max_frame(reader, config.max_frame);
    let mut ticker = tokio::time::interval(Duration::from_millis(TICK_MS));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut last_tick = Instant::now();

    while !session.game_over() {
        tokio::select! {
            frame = frames.next_frame() => match frame {
                Ok(Some(payload)) => {
                    if let Some(log) = wire_log.as_ref() {
                        log.record(Direction::In, peer.to_string(), &payload);
                    }
                    match parse_command(&payload) {
                        Some(command) => {
                            debug!("[Server] client {} {}", client_id, command.as_str());
                            session.apply_command(command);
                            session.take_events();
                            send_snapshot(&session, &tx);
                        }
                        None => {
                            warn!("[Server] client {} sent unknown command {:?}", client_id, payload);
                        }
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("[Server] client {} stream error: {}", client_id, e);
                    break;
                }
            },
            _ = ticker.tick() => {
                let now = Instant::now();
                let elapsed = now.duration_since(last_tick).as_millis() as u32;
                last_tick = now;

                session.tick(elapsed);
                let moved = session.take_events().iter().any(|e| {
                    matches!(e, GameEvent::PieceChanged(_) | GameEvent::BoardUpdated(_))
                });
                if moved {
                    send_snapshot(&session, &tx);
                }
            }
        }
    }

    if let Some(reason) = session.game_over_reason() {
        info!(
            "[Server] client {} game over ({:?}), score {}",
            client_id,
            reason,
            session.score()
        );
        let _ = tx.send(GAME_OVER_MESSAGE.to_string());
    }

    drop(tx);
    let _ = write_task.await;
    Ok(())
}
