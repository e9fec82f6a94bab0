//! Read-only views of the game for presentation.
//!
//! Nothing in here mutates game state: the projected grid is rebuilt from the
//! board and the active piece every time it is requested.

use crate::board::{Board, Grid};
use crate::game_state::Tetromino;
use crate::types::{PieceKind, Phase, BOARD_HEIGHT, BOARD_WIDTH};

/// Copy `board` into `out` and draw `active` over it.
///
/// Only minos inside the visible field are drawn; anything above row 0 is
/// cropped.
pub fn project_into(board: &Board, active: Option<&Tetromino>, out: &mut Grid) {
    board.write_u8_grid(out);

    let Some(piece) = active else {
        return;
    };
    for (x, y) in piece.cells() {
        if x >= 0 && x < BOARD_WIDTH as i8 && y >= 0 && y < BOARD_HEIGHT as i8 {
            out[y as usize][x as usize] = piece.kind.id();
        }
    }
}

/// Convenience wrapper around [`project_into`] returning a fresh grid.
pub fn project(board: &Board, active: Option<&Tetromino>) -> Grid {
    let mut out = Grid::default();
    project_into(board, active, &mut out);
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GameSnapshot {
    /// Board with the active piece overlaid (0 = empty, 1-7 = piece id)
    pub board: Grid,
    pub phase: Phase,
    pub paused: bool,
    pub score: u32,
    pub level: u32,
    pub lines: u32,
    pub next: Option<PieceKind>,
    /// Bit `y` is set while row `y` waits to be removed
    pub clearing_rows: u32,
}

impl GameSnapshot {
    pub fn running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    pub fn clearing(&self) -> bool {
        self.clearing_rows != 0
    }

    pub fn is_row_clearing(&self, y: usize) -> bool {
        y < 32 && self.clearing_rows & (1 << y) != 0
    }
}

/// Pack row indices into a bitmask (bit `y` per row).
pub fn row_mask(rows: &[usize]) -> u32 {
    rows.iter().fold(0, |mask, &y| mask | (1 << y))
}
