//! Game events - push notifications for observers
//!
//! The session queues events as state changes; callers drain them with
//! [`GameSession::take_events`](crate::session::GameSession::take_events) and
//! forward them wherever they are needed (a UI, a channel, a log).

use crate::board::Board;
use crate::pieces::Tetromino;

/// Why a game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverReason {
    /// A newly created piece collided at its spawn position
    SpawnBlocked,
    /// The session clock ran out
    TimeUp,
}

/// State change notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    ScoreChanged(u32),
    /// Whole seconds left on the clock
    TimeChanged(u32),
    /// The falling piece moved, rotated or was replaced
    PieceChanged(Tetromino),
    /// Locked cells changed (lock, line clear or snapshot)
    BoardUpdated(Board),
    GameOver(GameOverReason),
}

/// Format a second count as `m:ss`
///
/// ```
/// use net_tetris_core::format_clock;
///
/// assert_eq!(format_clock(120), "2:00");
/// assert_eq!(format_clock(65), "1:05");
/// assert_eq!(format_clock(0), "0:00");
/// ```
pub fn format_clock(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
