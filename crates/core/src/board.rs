//! Board module - the occupancy grid
//!
//! The board is a 20x10 grid where each cell is either empty or filled.
//! Uses a flat array for cache locality and zero allocation; cloning yields a
//! fully independent copy that can be handed to a renderer or kept as a
//! snapshot.
//! Coordinates are (row, col): row 0 is the top, col 0 the left edge.

use crate::error::CoreError;
use crate::types::{Cell, BOARD_COLS, BOARD_ROWS};

/// Total number of cells on the board
pub const BOARD_SIZE: usize = BOARD_ROWS * BOARD_COLS;

/// The game board - 20 rows x 10 columns using flat array storage
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    /// Flat array of cells, row-major order (row * COLS + col)
    cells: [Cell; BOARD_SIZE],
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Self {
            cells: [Cell::Empty; BOARD_SIZE],
        }
    }

    /// Build a board from row-major cells.
    pub fn from_cells(cells: [Cell; BOARD_SIZE]) -> Self {
        Self { cells }
    }

    #[inline(always)]
    fn index(row: usize, col: usize) -> Option<usize> {
        if row >= BOARD_ROWS || col >= BOARD_COLS {
            return None;
        }
        Some(row * BOARD_COLS + col)
    }

    pub fn rows(&self) -> usize {
        BOARD_ROWS
    }

    pub fn cols(&self) -> usize {
        BOARD_COLS
    }

    /// Get cell at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<Cell, CoreError> {
        Self::index(row, col)
            .map(|idx| self.cells[idx])
            .ok_or(CoreError::OutOfRange { row, col })
    }

    /// Set cell at (row, col)
    pub fn set(&mut self, row: usize, col: usize, cell: Cell) -> Result<(), CoreError> {
        let idx = Self::index(row, col).ok_or(CoreError::OutOfRange { row, col })?;
        self.cells[idx] = cell;
        Ok(())
    }

    /// Signed lookup used by the placement engine.
    ///
    /// Returns None when (x, y) falls outside the grid, where x is the column
    /// and y the row.
    #[inline]
    pub fn cell_at(&self, x: i32, y: i32) -> Option<Cell> {
        if x < 0 || y < 0 {
            return None;
        }
        Self::index(y as usize, x as usize).map(|idx| self.cells[idx])
    }

    /// Signed counterpart of [`Board::set`] for piece cells: fills (x, y) and
    /// returns true, or returns false when the cell lies outside the grid.
    #[inline]
    pub(crate) fn fill_at(&mut self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 {
            return false;
        }
        match Self::index(y as usize, x as usize) {
            Some(idx) => {
                self.cells[idx] = Cell::Filled;
                true
            }
            None => false,
        }
    }

    /// Check if a row is completely filled
    pub fn is_row_full(&self, row: usize) -> bool {
        self.row(row).iter().all(|c| c.is_filled())
    }

    /// Check if a row has no filled cells
    pub fn is_row_empty(&self, row: usize) -> bool {
        self.row(row).iter().all(|c| !c.is_filled())
    }

    /// Cells of one row. Panics if `row` is outside the board.
    pub fn row(&self, row: usize) -> &[Cell] {
        let start = row * BOARD_COLS;
        &self.cells[start..start + BOARD_COLS]
    }

    /// Copy row `src` over row `dst` (both must be in range)
    pub(crate) fn copy_row(&mut self, src: usize, dst: usize) {
        let src_start = src * BOARD_COLS;
        self.cells
            .copy_within(src_start..src_start + BOARD_COLS, dst * BOARD_COLS);
    }

    /// Empty one row (must be in range)
    pub(crate) fn clear_row(&mut self, row: usize) {
        let start = row * BOARD_COLS;
        self.cells[start..start + BOARD_COLS].fill(Cell::Empty);
    }

    /// Number of filled cells
    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_filled()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.filled_count() == 0
    }

    /// Get a reference to the internal cells array
    pub fn cells(&self) -> &[Cell; BOARD_SIZE] {
        &self.cells
    }

    /// Clear the entire board
    pub fn clear(&mut self) {
        self.cells.fill(Cell::Empty);
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
