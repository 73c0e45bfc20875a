//! Core game logic - pure, deterministic, and testable
//!
//! Everything here is free of networking and I/O. The same code runs as the
//! client's local prediction and as the reference server's authoritative
//! state, so both sides always agree on which positions are legal.
//!
//! # Module Structure
//!
//! - [`board`]: 20x10 occupancy grid
//! - [`pieces`]: tetromino shape matrices and clockwise rotation
//! - [`placement`]: collision test, locking and line clearing
//! - [`snapshot`]: `'0'`/`'1'` board snapshot codec and text rendering
//! - [`session`]: falling piece, score and countdown clock
//! - [`rng`]: injectable uniform piece selection
//!
//! # Game Rules
//!
//! - Uniform random piece selection (no bag)
//! - Plain 90° clockwise rotation, no wall kicks
//! - Flat 100 points per cleared line
//! - Game ends when a new piece cannot spawn or the clock runs out
//!
//! # Example
//!
//! ```
//! use net_tetris_core::{GameSession, ScriptedPieces, SessionConfig};
//! use net_tetris_core::types::{Command, PieceKind};
//!
//! let mut session = GameSession::new(
//!     Box::new(ScriptedPieces::new([PieceKind::O])),
//!     SessionConfig::default(),
//! );
//! session.start();
//!
//! session.apply_command(Command::MoveLeft);
//! session.apply_command(Command::HardDrop);
//!
//! assert_eq!(session.board().filled_count(), 4);
//! ```

pub mod board;
pub mod error;
pub mod events;
pub mod pieces;
pub mod placement;
pub mod rng;
pub mod session;
pub mod snapshot;

pub use net_tetris_types as types;

// Re-export commonly used types for convenience
pub use board::{Board, BOARD_SIZE};
pub use error::{CoreError, SnapshotError};
pub use events::{format_clock, GameEvent, GameOverReason};
pub use pieces::{get_shape, Shape, Tetromino};
pub use placement::{check_collision, clear_lines, compose, drop_distance, lock};
pub use rng::{PieceSource, ScriptedPieces, SimpleRng};
pub use session::{GameSession, LockOutcome, SessionConfig};
pub use snapshot::{decode_board, encode_board, is_snapshot_len, render_text};
