//! Board tests - grid accessors and copy semantics

use net_tetris::core::{Board, CoreError, BOARD_SIZE};
use net_tetris::types::{Cell, BOARD_COLS, BOARD_ROWS};

#[test]
fn test_board_new_empty() {
    let board = Board::new();
    assert_eq!(board.rows(), BOARD_ROWS);
    assert_eq!(board.cols(), BOARD_COLS);
    assert_eq!(board.cells().len(), BOARD_SIZE);

    // All cells should be empty
    for row in 0..BOARD_ROWS {
        for col in 0..BOARD_COLS {
            assert_eq!(board.get(row, col), Ok(Cell::Empty));
        }
    }
    assert!(board.is_empty());
}

#[test]
fn test_board_get_out_of_range() {
    let board = Board::new();

    assert_eq!(
        board.get(BOARD_ROWS, 0),
        Err(CoreError::OutOfRange { row: 20, col: 0 })
    );
    assert_eq!(
        board.get(0, BOARD_COLS),
        Err(CoreError::OutOfRange { row: 0, col: 10 })
    );
}

#[test]
fn test_board_set_out_of_range_leaves_board_untouched() {
    let mut board = Board::new();
    assert!(board.set(25, 3, Cell::Filled).is_err());
    assert!(board.set(3, 10, Cell::Filled).is_err());
    assert!(board.is_empty());
}

#[test]
fn test_board_set_and_get() {
    let mut board = Board::new();

    board.set(5, 7, Cell::Filled).unwrap();
    assert_eq!(board.get(5, 7), Ok(Cell::Filled));
    assert_eq!(board.filled_count(), 1);

    board.set(5, 7, Cell::Empty).unwrap();
    assert_eq!(board.get(5, 7), Ok(Cell::Empty));
    assert!(board.is_empty());
}

#[test]
fn test_board_clone_is_independent() {
    let mut board = Board::new();
    board.set(0, 0, Cell::Filled).unwrap();

    let mut copy = board.clone();
    copy.set(19, 9, Cell::Filled).unwrap();
    copy.set(0, 0, Cell::Empty).unwrap();

    assert_eq!(board.get(0, 0), Ok(Cell::Filled));
    assert_eq!(board.get(19, 9), Ok(Cell::Empty));
    assert_ne!(board, copy);
}

#[test]
fn test_row_queries() {
    let mut board = Board::new();
    for col in 0..BOARD_COLS {
        board.set(19, col, Cell::Filled).unwrap();
    }
    board.set(18, 4, Cell::Filled).unwrap();

    assert!(board.is_row_full(19));
    assert!(!board.is_row_full(18));
    assert!(!board.is_row_empty(18));
    assert!(board.is_row_empty(0));

    board.clear();
    assert!(board.is_empty());
}
