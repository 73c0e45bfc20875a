//! Board snapshot codec
//!
//! A snapshot is the whole board as a flat string of `'0'`/`'1'` characters,
//! one per cell, row-major with the top row first. Only payloads of exactly
//! rows*cols bytes are snapshots; anything else is some other message and is
//! never decoded as a board.

use crate::board::{Board, BOARD_SIZE};
use crate::error::SnapshotError;
use crate::pieces::Tetromino;
use crate::placement::compose;
use crate::types::{Cell, BOARD_COLS, SNAPSHOT_LEN};

/// Encode the board as a snapshot payload
pub fn encode_board(board: &Board) -> String {
    board.cells().iter().map(|c| c.as_char()).collect()
}

/// True if a payload has the length of a board snapshot
pub fn is_snapshot_len(payload: &str) -> bool {
    payload.len() == SNAPSHOT_LEN
}

/// Decode a snapshot payload into a fresh board
pub fn decode_board(payload: &str) -> Result<Board, SnapshotError> {
    let bytes = payload.as_bytes();
    if bytes.len() != SNAPSHOT_LEN {
        return Err(SnapshotError::UnrecognizedLength { len: bytes.len() });
    }

    let mut cells = [Cell::Empty; BOARD_SIZE];
    for (index, (&byte, cell)) in bytes.iter().zip(cells.iter_mut()).enumerate() {
        *cell = Cell::from_byte(byte).ok_or(SnapshotError::InvalidCell { index, byte })?;
    }
    Ok(Board::from_cells(cells))
}

/// Render the board (plus an optional falling piece) as `#`/`.` text rows
pub fn render_text(board: &Board, piece: Option<&Tetromino>) -> String {
    let composed = compose(board, piece);
    let mut out = String::with_capacity(SNAPSHOT_LEN + board.rows());
    for row in composed.cells().chunks(BOARD_COLS) {
        out.extend(row.iter().map(|c| if c.is_filled() { '#' } else { '.' }));
        out.push('\n');
    }
    out
}
