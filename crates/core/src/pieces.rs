//! Pieces module - tetromino shape matrices and rotation
//!
//! Each kind has a fixed binary matrix (rows x columns, at most 4x4). Shapes
//! live in fixed-capacity `ArrayVec`s, so rotating a piece never allocates.
//!
//! Rotation is a plain 90° clockwise matrix transform with no wall kicks: for
//! a matrix with `h` rows the rotated matrix satisfies
//! `new[j][i] = old[h - 1 - i][j]`. Rotating four times gives back the
//! original shape, and [`Shape::rotated_ccw`] is its exact inverse.

use arrayvec::ArrayVec;

use crate::types::{PieceKind, BOARD_COLS};

/// Largest extent of any shape matrix
pub const MAX_SHAPE_DIM: usize = 4;

type ShapeRow = ArrayVec<bool, MAX_SHAPE_DIM>;

/// Binary shape matrix, stored row by row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    rows: ArrayVec<ShapeRow, MAX_SHAPE_DIM>,
}

impl Shape {
    /// Build a shape from 0/1 rows.
    ///
    /// Panics if the matrix is empty, ragged, or larger than 4x4. Shapes are
    /// built from constants, so this is a programming error.
    pub fn from_rows(rows: &[&[u8]]) -> Self {
        assert!(!rows.is_empty() && rows.len() <= MAX_SHAPE_DIM);
        let width = rows[0].len();
        assert!(width > 0 && width <= MAX_SHAPE_DIM);

        let mut out = ArrayVec::new();
        for row in rows {
            assert_eq!(row.len(), width, "ragged shape matrix");
            out.push(row.iter().map(|&v| v != 0).collect());
        }
        Self { rows: out }
    }

    /// Number of matrix rows
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Number of matrix columns
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, |r| r.len())
    }

    pub fn is_filled(&self, row: usize, col: usize) -> bool {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(false)
    }

    /// Occupied cells as (row, col) offsets from the anchor
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter(|&(_, &filled)| filled)
                .map(move |(c, _)| (r, c))
        })
    }

    /// Rotate 90° clockwise: `new[j][i] = old[h - 1 - i][j]`
    pub fn rotated(&self) -> Shape {
        let h = self.height();
        let w = self.width();
        let mut rows = ArrayVec::new();
        for j in 0..w {
            let mut row = ShapeRow::new();
            for i in 0..h {
                row.push(self.rows[h - 1 - i][j]);
            }
            rows.push(row);
        }
        Shape { rows }
    }

    /// Rotate 90° counter-clockwise (inverse of [`Shape::rotated`])
    pub fn rotated_ccw(&self) -> Shape {
        let h = self.height();
        let w = self.width();
        let mut rows = ArrayVec::new();
        for j in 0..w {
            let mut row = ShapeRow::new();
            for i in 0..h {
                row.push(self.rows[i][w - 1 - j]);
            }
            rows.push(row);
        }
        Shape { rows }
    }
}

/// Canonical matrix for a piece kind
pub fn get_shape(kind: PieceKind) -> Shape {
    match kind {
        PieceKind::I => Shape::from_rows(&[&[1, 1, 1, 1]]),
        PieceKind::J => Shape::from_rows(&[&[1, 0, 0], &[1, 1, 1]]),
        PieceKind::L => Shape::from_rows(&[&[0, 0, 1], &[1, 1, 1]]),
        PieceKind::O => Shape::from_rows(&[&[1, 1], &[1, 1]]),
        PieceKind::S => Shape::from_rows(&[&[0, 1, 1], &[1, 1, 0]]),
        PieceKind::T => Shape::from_rows(&[&[0, 1, 0], &[1, 1, 1]]),
        PieceKind::Z => Shape::from_rows(&[&[1, 1, 0], &[0, 1, 1]]),
    }
}

/// Default anchor for a freshly created piece: horizontally centred, top row
pub fn spawn_position(shape: &Shape) -> (i8, i8) {
    let x = (BOARD_COLS / 2) as i8 - (shape.width() / 2) as i8;
    (x, 0)
}

/// Falling piece
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tetromino {
    pub kind: PieceKind,
    pub shape: Shape,
    pub x: i8,
    pub y: i8,
}

impl Tetromino {
    /// Create a piece of `kind` at the default (unvalidated) spawn position
    pub fn new(kind: PieceKind) -> Self {
        let shape = get_shape(kind);
        let (x, y) = spawn_position(&shape);
        Self { kind, shape, x, y }
    }

    /// Candidate shape after a clockwise rotation; `self` is left untouched
    pub fn rotated(&self) -> Shape {
        self.shape.rotated()
    }

    /// Candidate anchor after a translation
    pub fn moved_by(&self, dx: i8, dy: i8) -> (i8, i8) {
        (self.x.saturating_add(dx), self.y.saturating_add(dy))
    }

    /// Absolute (x, y) board coordinates of every occupied cell
    pub fn board_cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        let (x, y) = (self.x as i32, self.y as i32);
        self.shape
            .cells()
            .map(move |(r, c)| (x + c as i32, y + r as i32))
    }
}
