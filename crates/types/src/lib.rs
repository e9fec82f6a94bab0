//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the application.
//! All types are pure data structures with no external dependencies, making them
//! usable in any context (rules core, game loop, terminal rendering).
//!
//! # Board Dimensions
//!
//! The playfield is fixed:
//!
//! - **Width**: 10 columns (indexed 0-9)
//! - **Height**: 20 rows (indexed 0-19, row 0 at the top)
//!
//! # Cell Values
//!
//! A cell value is `0` for empty or a piece id `1..=7`. The id doubles as the
//! color key used by the presentation layer:
//!
//! | Id | Piece |
//! |----|-------|
//! | 1 | I |
//! | 2 | J |
//! | 3 | L |
//! | 4 | O |
//! | 5 | S |
//! | 6 | T |
//! | 7 | Z |
//!
//! # Game Timing Constants
//!
//! Timing values are in milliseconds:
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `TICK_MS` | 16 | Frontend frame interval (~60 FPS) |
//! | `BASE_GRAVITY_MS` | 1000 | Gravity period at level 1 |
//! | `GRAVITY_STEP_MS` | 100 | Period reduction per level |
//! | `MIN_GRAVITY_MS` | 100 | Gravity period floor |
//! | `LINE_CLEAR_DELAY_MS` | 500 | Rows stay visible this long before removal |
//!
//! # Examples
//!
//! ```
//! use blockfall_types::{GameAction, PieceKind, BOARD_HEIGHT, BOARD_WIDTH};
//!
//! // Piece ids are stable color keys
//! assert_eq!(PieceKind::T.id(), 6);
//! assert_eq!(PieceKind::from_id(6), Some(PieceKind::T));
//!
//! // Parse from string (case-insensitive)
//! assert_eq!(PieceKind::from_str("z"), Some(PieceKind::Z));
//!
//! // Parse game action
//! let action = GameAction::from_str("hardDrop").unwrap();
//! assert_eq!(action, GameAction::HardDrop);
//!
//! // Board dimensions
//! assert_eq!(BOARD_WIDTH, 10);
//! assert_eq!(BOARD_HEIGHT, 20);
//! ```

/// Board width in cells (10 columns)
pub const BOARD_WIDTH: u8 = 10;

/// Board height in cells (20 rows)
pub const BOARD_HEIGHT: u8 = 20;

/// Frontend frame interval in milliseconds (16ms ≈ 60 FPS)
pub const TICK_MS: u32 = 16;

/// Gravity period at level 1 (1000ms = 1 second per row)
pub const BASE_GRAVITY_MS: u32 = 1000;

/// Gravity period reduction for every level above 1
pub const GRAVITY_STEP_MS: u32 = 100;

/// Gravity period never drops below this
pub const MIN_GRAVITY_MS: u32 = 100;

/// Delay between flagging completed rows and removing them
pub const LINE_CLEAR_DELAY_MS: u32 = 500;

/// Lines needed to advance one level
pub const LINES_PER_LEVEL: u32 = 10;

/// Line clear scoring table, indexed by the number of rows cleared at once.
///
/// - 0 lines: 0 points
/// - 1 line: 40 points
/// - 2 lines: 100 points
/// - 3 lines: 300 points
/// - 4 lines: 1200 points
///
/// Points are multiplied by the current level (which starts at 1).
pub const LINE_SCORES: [u32; 5] = [0, 40, 100, 300, 1200];

/// The seven tetromino piece kinds
///
/// Each piece has a distinct shape and a fixed id (1-7) that is written into
/// board cells and used as the color key:
/// - **I**: Cyan, 4x4 bar
/// - **J**: Blue, J-shaped
/// - **L**: Orange, L-shaped (mirror of J)
/// - **O**: Yellow, 2x2 square
/// - **S**: Green, S-shaped
/// - **T**: Magenta, T-shaped
/// - **Z**: Red, Z-shaped (mirror of S)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    I,
    J,
    L,
    O,
    S,
    T,
    Z,
}

impl PieceKind {
    /// All kinds in id order.
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::J,
        PieceKind::L,
        PieceKind::O,
        PieceKind::S,
        PieceKind::T,
        PieceKind::Z,
    ];

    /// Non-zero cell id / color key (1-7)
    pub const fn id(self) -> u8 {
        match self {
            PieceKind::I => 1,
            PieceKind::J => 2,
            PieceKind::L => 3,
            PieceKind::O => 4,
            PieceKind::S => 5,
            PieceKind::T => 6,
            PieceKind::Z => 7,
        }
    }

    /// Zero-based index into [`PieceKind::ALL`]
    pub const fn index(self) -> usize {
        self.id() as usize - 1
    }

    /// Inverse of [`PieceKind::id`]. `0` and anything above 7 map to `None`.
    ///
    /// # Examples
    ///
    /// ```
    /// use blockfall_types::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_id(1), Some(PieceKind::I));
    /// assert_eq!(PieceKind::from_id(0), None);
    /// assert_eq!(PieceKind::from_id(8), None);
    /// ```
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1..=7 => Some(Self::ALL[id as usize - 1]),
            _ => None,
        }
    }

    /// Parse piece kind from string (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use blockfall_types::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_str("i"), Some(PieceKind::I));
    /// assert_eq!(PieceKind::from_str("O"), Some(PieceKind::O));
    /// assert_eq!(PieceKind::from_str("unknown"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "i" => Some(PieceKind::I),
            "j" => Some(PieceKind::J),
            "l" => Some(PieceKind::L),
            "o" => Some(PieceKind::O),
            "s" => Some(PieceKind::S),
            "t" => Some(PieceKind::T),
            "z" => Some(PieceKind::Z),
            _ => None,
        }
    }

    /// Convert to uppercase single-letter name
    pub fn as_str(&self) -> &'static str {
        match self {
            PieceKind::I => "I",
            PieceKind::J => "J",
            PieceKind::L => "L",
            PieceKind::O => "O",
            PieceKind::S => "S",
            PieceKind::T => "T",
            PieceKind::Z => "Z",
        }
    }
}

/// Commands the input layer can issue against the game loop.
///
/// Illegal moves are silently rejected by the rules core, so none of these
/// carry an error path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameAction {
    /// Move piece one cell left
    MoveLeft,
    /// Move piece one cell right
    MoveRight,
    /// Move piece one cell down, locking it if it cannot move
    MoveDown,
    /// Rotate piece 90° clockwise (no wall kicks)
    Rotate,
    /// Drop piece to its landing row and lock it
    HardDrop,
    /// Reset everything and begin a new game
    Start,
    /// Suppress gravity
    Pause,
    /// Re-enable gravity
    Resume,
    /// Pause when running, resume when paused
    TogglePause,
}

impl GameAction {
    /// Parse action from string
    ///
    /// # Examples
    ///
    /// ```
    /// use blockfall_types::GameAction;
    ///
    /// assert_eq!(GameAction::from_str("moveLeft"), Some(GameAction::MoveLeft));
    /// assert_eq!(GameAction::from_str("rotate"), Some(GameAction::Rotate));
    /// assert_eq!(GameAction::from_str("unknown"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "moveleft" => Some(GameAction::MoveLeft),
            "moveright" => Some(GameAction::MoveRight),
            "movedown" => Some(GameAction::MoveDown),
            "rotate" => Some(GameAction::Rotate),
            "harddrop" => Some(GameAction::HardDrop),
            "start" => Some(GameAction::Start),
            "pause" => Some(GameAction::Pause),
            "resume" => Some(GameAction::Resume),
            "togglepause" => Some(GameAction::TogglePause),
            _ => None,
        }
    }

    /// Convert to camelCase string
    pub fn as_str(&self) -> &'static str {
        match self {
            GameAction::MoveLeft => "moveLeft",
            GameAction::MoveRight => "moveRight",
            GameAction::MoveDown => "moveDown",
            GameAction::Rotate => "rotate",
            GameAction::HardDrop => "hardDrop",
            GameAction::Start => "start",
            GameAction::Pause => "pause",
            GameAction::Resume => "resume",
            GameAction::TogglePause => "togglePause",
        }
    }

    /// Whether the action moves or rotates the active piece.
    pub fn is_movement(&self) -> bool {
        matches!(
            self,
            GameAction::MoveLeft
                | GameAction::MoveRight
                | GameAction::MoveDown
                | GameAction::Rotate
                | GameAction::HardDrop
        )
    }
}

/// Lifecycle phase of a game.
///
/// Pausing is a flag layered on top of `Running` rather than a phase of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    /// Before the first start
    #[default]
    Idle,
    Running,
    /// Spawn collided; re-entered into `Running` by a new start
    GameOver,
}

/// State change notification recorded by the rules core at the moment it happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    Started,
    Paused,
    Resumed,
    PieceSpawned { kind: PieceKind },
    PieceLocked { kind: PieceKind },
    /// Completed rows flagged; bit `y` of `rows` is set for each flagged row.
    LineClearStarted { rows: u32 },
    /// Flagged rows were removed and counters committed.
    LinesCleared { count: u8, points: u32 },
    LevelChanged { level: u32 },
    GameOver { score: u32 },
}

/// A cell on the game board
///
/// - `None`: Empty cell
/// - `Some(PieceKind)`: Cell filled with the specified piece kind
pub type Cell = Option<PieceKind>;

/// Numeric cell value (0 = empty, otherwise the piece id).
pub fn cell_value(cell: Cell) -> u8 {
    cell.map_or(0, PieceKind::id)
}
