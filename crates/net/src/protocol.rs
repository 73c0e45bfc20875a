//! Payload classification
//!
//! Payloads are opaque text to the framing layer. This module decides what a
//! received payload means:
//!
//! - exactly `rows * cols` characters of `'0'`/`'1'`: a board snapshot
//! - `game_over`: the remote session ended
//! - anything else: unrecognized; logged by the caller and never rendered
//!
//! Commands travel the other way as their literal names (`move_left`,
//! `move_right`, `move_down`, `rotate`, `hard_drop`).

use log::warn;

use net_tetris_core::{decode_board, Board, SnapshotError};
use net_tetris_types::{Command, GAME_OVER_MESSAGE};

/// A received payload, classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    Snapshot(Board),
    GameOver,
    Unrecognized(String),
}

/// Classify one received payload
pub fn classify(payload: String) -> InboundMessage {
    if payload == GAME_OVER_MESSAGE {
        return InboundMessage::GameOver;
    }

    match decode_board(&payload) {
        Ok(board) => InboundMessage::Snapshot(board),
        Err(e @ SnapshotError::InvalidCell { .. }) => {
            warn!("[Net] rejecting snapshot-sized payload: {}", e);
            InboundMessage::Unrecognized(payload)
        }
        Err(SnapshotError::UnrecognizedLength { .. }) => InboundMessage::Unrecognized(payload),
    }
}

/// Payload that carries `command` to the server
pub fn command_payload(command: Command) -> &'static str {
    command.as_str()
}

/// Parse a command payload received by the server (exact literal match)
pub fn parse_command(payload: &str) -> Option<Command> {
    Command::from_str(payload)
}
