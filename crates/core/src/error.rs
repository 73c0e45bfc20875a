//! Error types for the board model and snapshot codec.

use thiserror::Error;

/// Errors raised by board accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Row/column outside the 20x10 grid.
    #[error("cell ({row}, {col}) is outside the board")]
    OutOfRange { row: usize, col: usize },
}

/// Errors raised when a payload is interpreted as a board snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SnapshotError {
    /// Payload length is not rows*cols; it is some other message.
    #[error("payload of {len} bytes is not a board snapshot")]
    UnrecognizedLength { len: usize },

    /// Snapshot-sized payload containing something other than '0'/'1'.
    #[error("invalid snapshot cell {byte:#04x} at index {index}")]
    InvalidCell { index: usize, byte: u8 },
}
