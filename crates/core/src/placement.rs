//! Placement engine - collision, locking and line clearing
//!
//! These functions are the single authority on whether a piece position is
//! legal. Both the client's prediction and the reference server run exactly
//! this code, so the two agree on every move.

use crate::board::Board;
use crate::pieces::{Shape, Tetromino};
use crate::types::{BOARD_ROWS, LINE_CLEAR_POINTS};

/// True if `shape` anchored at (x, y) leaves the board or overlaps a filled cell
pub fn check_collision(board: &Board, x: i8, y: i8, shape: &Shape) -> bool {
    shape.cells().any(|(row, col)| {
        let board_x = x as i32 + col as i32;
        let board_y = y as i32 + row as i32;
        match board.cell_at(board_x, board_y) {
            None => true,
            Some(cell) => cell.is_filled(),
        }
    })
}

/// True if the piece collides where it currently stands
pub fn piece_collides(board: &Board, piece: &Tetromino) -> bool {
    check_collision(board, piece.x, piece.y, &piece.shape)
}

/// Commit every occupied cell of `piece` into the board.
///
/// The piece must be at a legal position (see [`check_collision`]).
pub fn lock(board: &mut Board, piece: &Tetromino) {
    debug_assert!(
        !piece_collides(board, piece),
        "locking a piece at an illegal position"
    );
    for (x, y) in piece.board_cells() {
        let filled = board.fill_at(x, y);
        debug_assert!(filled, "piece cell ({}, {}) outside the board", x, y);
    }
}

/// Remove all full rows, shifting the rows above down. Returns the count.
///
/// Rows are scanned bottom to top. After a full row is removed the same index
/// is examined again, since the row above has just moved into it; this is
/// what makes stacked full rows clear in a single pass.
pub fn clear_lines(board: &mut Board) -> u32 {
    let mut lines_cleared = 0;
    let mut row = BOARD_ROWS;

    while row > 0 {
        let r = row - 1;
        if board.is_row_full(r) {
            lines_cleared += 1;
            for dst in (1..=r).rev() {
                board.copy_row(dst - 1, dst);
            }
            board.clear_row(0);
            // Re-check the same index.
            continue;
        }
        row -= 1;
    }

    lines_cleared
}

/// Points for clearing `lines` rows at once (flat, not tiered)
pub fn line_clear_score(lines: u32) -> u32 {
    lines * LINE_CLEAR_POINTS
}

/// How many rows the piece can fall before it would collide
pub fn drop_distance(board: &Board, piece: &Tetromino) -> i8 {
    let mut distance = 0i8;
    while (distance as usize) < BOARD_ROWS
        && !check_collision(board, piece.x, piece.y + distance + 1, &piece.shape)
    {
        distance += 1;
    }
    distance
}

/// Board with `piece` drawn into it (cells outside the grid are skipped)
pub fn compose(board: &Board, piece: Option<&Tetromino>) -> Board {
    let mut out = board.clone();
    if let Some(piece) = piece {
        for (x, y) in piece.board_cells() {
            out.fill_at(x, y);
        }
    }
    out
}
