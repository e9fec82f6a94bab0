//! Board module - manages the game grid
//!
//! The board is a 10x20 grid where each cell can be empty or filled with a piece kind.
//! Uses a flat array for better cache locality and zero-allocation.
//! Coordinates: (x, y) where x ranges 0..9 (left to right), y ranges 0..19 (top to bottom).
//!
//! The row count never changes: removing rows always refills the top with empty rows.

use arrayvec::ArrayVec;

use crate::types::{cell_value, Cell, BOARD_HEIGHT, BOARD_WIDTH};

/// Total number of cells on the board
const BOARD_SIZE: usize = (BOARD_WIDTH as usize) * (BOARD_HEIGHT as usize);

const WIDTH: usize = BOARD_WIDTH as usize;
const HEIGHT: usize = BOARD_HEIGHT as usize;

/// Row indices of completed rows. A locked piece spans at most four rows.
pub type FullRows = ArrayVec<usize, 4>;

/// Plain `u8` view of the board (0 = empty, 1-7 = piece id).
pub type Grid = [[u8; WIDTH]; HEIGHT];

/// The game board - 10 columns x 20 rows using flat array storage
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    /// Flat array of cells, row-major order (y * WIDTH + x)
    cells: [Cell; BOARD_SIZE],
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Self {
            cells: [None; BOARD_SIZE],
        }
    }

    /// Calculate flat index from (x, y) coordinates
    #[inline(always)]
    fn index(x: i8, y: i8) -> Option<usize> {
        if x < 0 || x >= BOARD_WIDTH as i8 || y < 0 || y >= BOARD_HEIGHT as i8 {
            return None;
        }
        Some((y as usize) * WIDTH + (x as usize))
    }

    pub fn width(&self) -> u8 {
        BOARD_WIDTH
    }

    pub fn height(&self) -> u8 {
        BOARD_HEIGHT
    }

    /// Get cell at position (x, y)
    /// Returns None if out of bounds
    pub fn get(&self, x: i8, y: i8) -> Option<Cell> {
        Self::index(x, y).map(|idx| self.cells[idx])
    }

    /// Whether a mino may not occupy (x, y).
    ///
    /// Left, right and below the field count as blocking. Anything above the
    /// field (y < 0) is open so pieces can overlap the top edge while spawning.
    pub fn is_occupied(&self, x: i8, y: i8) -> bool {
        if x < 0 || x >= BOARD_WIDTH as i8 || y >= BOARD_HEIGHT as i8 {
            return true;
        }
        if y < 0 {
            return false;
        }
        self.cells[(y as usize) * WIDTH + (x as usize)].is_some()
    }

    /// Write a cell.
    ///
    /// # Panics
    ///
    /// Panics if (x, y) lies outside the field. Callers validate placement first,
    /// so an out-of-range write is a bug, not a rejected move.
    pub fn set(&mut self, x: i8, y: i8, cell: Cell) {
        let idx = Self::index(x, y)
            .unwrap_or_else(|| panic!("board write out of bounds at ({x}, {y})"));
        self.cells[idx] = cell;
    }

    /// Check if a row is completely filled
    ///
    /// # Panics
    ///
    /// Panics if `y` is not a row of the field.
    pub fn is_row_full(&self, y: usize) -> bool {
        assert!(y < HEIGHT, "row {y} out of bounds");
        self.row(y).iter().all(|cell| cell.is_some())
    }

    /// Check if a row has no filled cells
    pub fn is_row_empty(&self, y: usize) -> bool {
        assert!(y < HEIGHT, "row {y} out of bounds");
        self.row(y).iter().all(|cell| cell.is_none())
    }

    /// Cells of row `y`, left to right.
    pub fn row(&self, y: usize) -> &[Cell] {
        let start = y * WIDTH;
        &self.cells[start..start + WIDTH]
    }

    /// Completed rows, scanned bottom to top (at most four).
    pub fn full_rows(&self) -> FullRows {
        let mut rows = FullRows::new();
        for y in (0..HEIGHT).rev() {
            // Only a hand-prepared board can hold more than four; the rest
            // are picked up by the next scan
            if self.is_row_full(y) && rows.try_push(y).is_err() {
                break;
            }
        }
        rows
    }

    /// Remove row `y`, shift every row above it down by one and insert an
    /// empty row at the top.
    pub fn remove_row(&mut self, y: usize) {
        assert!(y < HEIGHT, "row {y} out of bounds");

        // copy_within handles overlapping ranges safely
        for row in (1..=y).rev() {
            let src_start = (row - 1) * WIDTH;
            self.cells.copy_within(src_start..src_start + WIDTH, row * WIDTH);
        }
        self.insert_empty_row_at_top();
    }

    /// Blank the top row. Only meaningful right after the rows below have been
    /// shifted down, which is why it stays crate-private.
    pub(crate) fn insert_empty_row_at_top(&mut self) {
        self.cells[..WIDTH].fill(None);
    }

    /// Remove every row listed in `rows` at once.
    ///
    /// Surviving rows keep their relative order and settle at the bottom; the
    /// freed rows reappear empty at the top. Uses a single bottom-up pass with
    /// zero allocation.
    pub fn remove_rows(&mut self, rows: &[usize]) {
        let mut write_y = HEIGHT;

        for read_y in (0..HEIGHT).rev() {
            if rows.contains(&read_y) {
                continue;
            }
            write_y -= 1;
            if write_y != read_y {
                let src_start = read_y * WIDTH;
                self.cells
                    .copy_within(src_start..src_start + WIDTH, write_y * WIDTH);
            }
        }

        self.cells[..write_y * WIDTH].fill(None);
    }

    /// Number of filled cells on the board
    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// Write the board as plain cell values into `out`.
    pub fn write_u8_grid(&self, out: &mut Grid) {
        for (y, row) in out.iter_mut().enumerate() {
            for (x, v) in row.iter_mut().enumerate() {
                *v = cell_value(self.cells[y * WIDTH + x]);
            }
        }
    }

    /// Create from a 2D vector for testing (converts to flat array)
    #[cfg(test)]
    pub fn from_cells(cells_2d: Vec<Vec<Cell>>) -> Self {
        assert_eq!(cells_2d.len(), HEIGHT);
        assert!(cells_2d.iter().all(|row| row.len() == WIDTH));

        let mut flat = [None; BOARD_SIZE];
        for (y, row) in cells_2d.iter().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                flat[y * WIDTH + x] = *cell;
            }
        }
        Self { cells: flat }
    }

    /// Convert to 2D vector for testing/display
    #[cfg(test)]
    pub fn to_cells(&self) -> Vec<Vec<Cell>> {
        (0..HEIGHT).map(|y| self.row(y).to_vec()).collect()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PieceKind;

    fn fill_row(board: &mut Board, y: i8, kind: PieceKind) {
        for x in 0..BOARD_WIDTH as i8 {
            board.set(x, y, Some(kind));
        }
    }

    #[test]
    fn test_board_index_calculation() {
        assert_eq!(Board::index(0, 0), Some(0));
        assert_eq!(Board::index(9, 0), Some(9));
        assert_eq!(Board::index(0, 1), Some(10));
        assert_eq!(Board::index(9, 19), Some(199));
        assert_eq!(Board::index(-1, 0), None);
        assert_eq!(Board::index(10, 0), None);
        assert_eq!(Board::index(0, 20), None);
    }

    #[test]
    fn test_is_occupied_edges() {
        let board = Board::new();

        assert!(board.is_occupied(-1, 5));
        assert!(board.is_occupied(10, 5));
        assert!(board.is_occupied(3, 20));
        // Above the field is open
        assert!(!board.is_occupied(3, -1));
        assert!(!board.is_occupied(3, -4));
        // Above the field but outside the walls still blocks
        assert!(board.is_occupied(-1, -1));
        assert!(!board.is_occupied(0, 0));
    }

    #[test]
    fn test_is_occupied_filled_cell() {
        let mut board = Board::new();
        board.set(4, 7, Some(PieceKind::S));
        assert!(board.is_occupied(4, 7));
        assert!(!board.is_occupied(5, 7));
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_set_out_of_bounds_panics() {
        let mut board = Board::new();
        board.set(10, 0, Some(PieceKind::I));
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_set_above_field_panics() {
        let mut board = Board::new();
        board.set(0, -1, Some(PieceKind::I));
    }

    #[test]
    fn test_full_rows_bottom_to_top() {
        let mut board = Board::new();
        fill_row(&mut board, 19, PieceKind::I);
        fill_row(&mut board, 17, PieceKind::J);
        board.set(0, 18, Some(PieceKind::O));

        let rows = board.full_rows();
        assert_eq!(rows.as_slice(), &[19, 17]);
        assert!(!board.is_row_full(18));
    }

    #[test]
    fn test_remove_row_shifts_down() {
        let mut board = Board::new();
        fill_row(&mut board, 19, PieceKind::I);
        board.set(2, 18, Some(PieceKind::T));
        board.set(5, 0, Some(PieceKind::L));

        board.remove_row(19);

        assert_eq!(board.get(2, 19), Some(Some(PieceKind::T)));
        assert_eq!(board.get(5, 1), Some(Some(PieceKind::L)));
        assert!(board.is_row_empty(0));
        assert_eq!(board.filled_count(), 2);
    }

    #[test]
    fn test_remove_rows_keeps_survivor_order() {
        let mut board = Board::new();
        fill_row(&mut board, 19, PieceKind::I);
        board.set(0, 18, Some(PieceKind::J));
        fill_row(&mut board, 17, PieceKind::I);
        board.set(1, 16, Some(PieceKind::L));
        board.set(2, 15, Some(PieceKind::O));

        board.remove_rows(&[19, 17]);

        // Survivors 18, 16, 15 settle at 19, 18, 17 in the same order
        assert_eq!(board.get(0, 19), Some(Some(PieceKind::J)));
        assert_eq!(board.get(1, 18), Some(Some(PieceKind::L)));
        assert_eq!(board.get(2, 17), Some(Some(PieceKind::O)));
        assert_eq!(board.filled_count(), 3);
        assert_eq!(board.to_cells().len(), BOARD_HEIGHT as usize);
        assert!(board.full_rows().is_empty());
    }

    #[test]
    fn test_remove_rows_four_at_once() {
        let mut board = Board::new();
        for y in 16..20 {
            fill_row(&mut board, y, PieceKind::I);
        }
        board.set(9, 15, Some(PieceKind::Z));

        board.remove_rows(&[19, 18, 17, 16]);

        assert_eq!(board.get(9, 19), Some(Some(PieceKind::Z)));
        assert_eq!(board.filled_count(), 1);
    }

    #[test]
    fn test_remove_rows_matches_repeated_remove_row() {
        let mut cells = vec![vec![None; 10]; 20];
        for x in 0..10 {
            cells[19][x] = Some(PieceKind::I);
            cells[17][x] = Some(PieceKind::T);
        }
        cells[18][3] = Some(PieceKind::S);
        cells[12][7] = Some(PieceKind::Z);

        let mut batch = Board::from_cells(cells.clone());
        batch.remove_rows(&[19, 17]);

        // Removing the upper row first keeps the lower index stable
        let mut single = Board::from_cells(cells);
        single.remove_row(17);
        single.remove_row(19);

        assert_eq!(batch, single);
    }

    #[test]
    fn test_write_u8_grid() {
        let mut board = Board::new();
        board.set(0, 0, Some(PieceKind::I));
        board.set(9, 19, Some(PieceKind::Z));

        let mut grid = [[0u8; 10]; 20];
        board.write_u8_grid(&mut grid);

        assert_eq!(grid[0][0], 1);
        assert_eq!(grid[19][9], 7);
        assert_eq!(grid.iter().flatten().filter(|v| **v != 0).count(), 2);
    }
}
