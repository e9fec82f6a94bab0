//! Pieces module - tetromino templates and matrix rotation
//!
//! Every piece is a small square grid (2x2, 3x3 or 4x4) whose filled cells
//! carry the piece id. Rotation is a plain 90° clockwise matrix transform with
//! no kick table: a rotated grid either fits where the piece stands or the
//! rotation is dropped.

use crate::types::PieceKind;

/// Largest template edge (the I piece)
pub const MAX_SHAPE_SIZE: usize = 4;

/// Square orientation grid of a piece.
///
/// Only the top-left `size x size` corner of `cells` is meaningful; the rest
/// stays zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    size: u8,
    cells: [[u8; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE],
}

impl Shape {
    /// Build a shape from an `N x N` row-major grid (top row first).
    pub const fn from_rows<const N: usize>(rows: [[u8; N]; N]) -> Self {
        assert!(N >= 1 && N <= MAX_SHAPE_SIZE, "shape size out of range");

        let mut cells = [[0u8; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE];
        let mut y = 0;
        while y < N {
            let mut x = 0;
            while x < N {
                cells[y][x] = rows[y][x];
                x += 1;
            }
            y += 1;
        }
        Self {
            size: N as u8,
            cells,
        }
    }

    /// Edge length of the grid
    pub fn size(&self) -> usize {
        self.size as usize
    }

    /// Width used for horizontal centering (grids are square, so this is the size)
    pub fn width(&self) -> usize {
        self.size()
    }

    /// Cell value at local (x, y); zero outside the grid
    pub fn get(&self, x: usize, y: usize) -> u8 {
        if x >= self.size() || y >= self.size() {
            return 0;
        }
        self.cells[y][x]
    }

    /// Rows of the grid, each trimmed to `size` cells.
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.cells[..self.size()]
            .iter()
            .map(move |row| &row[..self.size()])
    }

    /// Local offsets and values of every filled cell, row by row.
    pub fn minos(&self) -> impl Iterator<Item = (i8, i8, u8)> + '_ {
        let n = self.size();
        (0..n).flat_map(move |y| {
            (0..n).filter_map(move |x| {
                let v = self.cells[y][x];
                (v != 0).then_some((x as i8, y as i8, v))
            })
        })
    }

    /// 90° clockwise rotation: `out[x][n - 1 - y] = in[y][x]`.
    ///
    /// Returns a new grid; `self` is left untouched.
    pub fn rotate_cw(&self) -> Shape {
        let n = self.size();
        let mut cells = [[0u8; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE];
        for y in 0..n {
            for x in 0..n {
                cells[x][n - 1 - y] = self.cells[y][x];
            }
        }
        Shape {
            size: self.size,
            cells,
        }
    }
}

const I_SHAPE: Shape = Shape::from_rows([
    [0, 0, 0, 0],
    [1, 1, 1, 1],
    [0, 0, 0, 0],
    [0, 0, 0, 0],
]);

const J_SHAPE: Shape = Shape::from_rows([
    [2, 0, 0],
    [2, 2, 2],
    [0, 0, 0],
]);

const L_SHAPE: Shape = Shape::from_rows([
    [0, 0, 3],
    [3, 3, 3],
    [0, 0, 0],
]);

const O_SHAPE: Shape = Shape::from_rows([
    [4, 4],
    [4, 4],
]);

const S_SHAPE: Shape = Shape::from_rows([
    [0, 5, 5],
    [5, 5, 0],
    [0, 0, 0],
]);

const T_SHAPE: Shape = Shape::from_rows([
    [0, 6, 0],
    [6, 6, 6],
    [0, 0, 0],
]);

const Z_SHAPE: Shape = Shape::from_rows([
    [7, 7, 0],
    [0, 7, 7],
    [0, 0, 0],
]);

/// Templates indexed by [`PieceKind::index`]
const TEMPLATES: [Shape; 7] = [
    I_SHAPE, J_SHAPE, L_SHAPE, O_SHAPE, S_SHAPE, T_SHAPE, Z_SHAPE,
];

/// Spawn orientation of a piece kind.
pub fn template(kind: PieceKind) -> Shape {
    TEMPLATES[kind.index()]
}

/// Rotate any orientation grid 90° clockwise.
pub fn rotate_clockwise(shape: &Shape) -> Shape {
    shape.rotate_cw()
}
