//! Game state module - manages the complete game state
//!
//! This module ties together all core components: board, pieces, RNG, and scoring.
//! It handles piece movement and rotation, lock-in, the two-step line clear
//! (flag rows, then remove them once the presentation delay has elapsed) and the
//! game lifecycle.
//!
//! Time is not tracked here. The owner of the state drives gravity by calling
//! [`GameState::move_down`] and finishes a pending clear with
//! [`GameState::complete_line_clear`]; every state change is recorded as a
//! [`GameEvent`] so the owner can react (schedule timers, notify observers).

use tracing::{debug, info};

use crate::board::{Board, FullRows, Grid};
use crate::pieces::{rotate_clockwise, template, Shape};
use crate::rng::{random_piece, SimpleRng};
use crate::scoring::{calculate_level, calculate_line_score, gravity_interval_ms};
use crate::snapshot::{project, project_into, row_mask, GameSnapshot};
use crate::types::*;

/// Active falling piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tetromino {
    pub kind: PieceKind,
    /// Current orientation (a rotation of the kind's template)
    pub shape: Shape,
    /// Board column of the grid's left edge
    pub x: i8,
    /// Board row of the grid's top edge; negative while poking above the field
    pub y: i8,
}

impl Tetromino {
    /// Create a new tetromino in spawn orientation, horizontally centered on row 0
    pub fn new(kind: PieceKind) -> Self {
        let shape = template(kind);
        Self {
            kind,
            shape,
            x: (BOARD_WIDTH / 2) as i8 - (shape.width() / 2) as i8,
            y: 0,
        }
    }

    /// Absolute board coordinates of every mino
    pub fn cells(&self) -> impl Iterator<Item = (i8, i8)> + '_ {
        self.shape
            .minos()
            .map(move |(dx, dy, _)| (self.x + dx, self.y + dy))
    }

    /// Check whether the piece, shifted by (dx, dy) and optionally using a
    /// candidate orientation, fits on the board.
    ///
    /// A mino fails when it is left of, right of or below the field, or when it
    /// lands on a filled cell. Minos above the field always fit.
    pub fn is_valid_placement(
        &self,
        board: &Board,
        dx: i8,
        dy: i8,
        candidate: Option<&Shape>,
    ) -> bool {
        let shape = candidate.unwrap_or(&self.shape);
        let x = self.x + dx;
        let y = self.y + dy;

        shape.minos().all(|(mx, my, _)| {
            let bx = x + mx;
            let by = y + my;
            if bx < 0 || bx >= BOARD_WIDTH as i8 || by >= BOARD_HEIGHT as i8 {
                return false;
            }
            by < 0 || !board.is_occupied(bx, by)
        })
    }
}

/// Result of a single downward step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The piece fell one row
    Moved,
    /// The piece could not fall and was merged into the board
    Locked,
    /// Nothing to move (no active piece, paused, clearing or not running).
    /// A silent rejection beyond the moved/locked pair; it is what ends the
    /// [`GameState::hard_drop`] loop once a lock hands off to a clear.
    Ignored,
}

/// Events kept for an owner that never calls [`GameState::take_events`].
/// When full, the oldest half is dropped.
pub const EVENT_BACKLOG: usize = 256;

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    board: Board,
    active: Option<Tetromino>,
    /// Empty only before the first spawn of a game
    next: Option<PieceKind>,
    rng: SimpleRng,
    seed: u32,
    phase: Phase,
    paused: bool,
    /// Rows flagged complete and waiting for [`GameState::complete_line_clear`]
    pending_clear: FullRows,
    score: u32,
    level: u32,
    lines: u32,
    /// Monotonic id for spawned pieces within the current game
    piece_id: u32,
    /// Changes recorded since the last [`GameState::take_events`], at most
    /// [`EVENT_BACKLOG`]
    events: Vec<GameEvent>,
}

impl GameState {
    /// Create an idle game with the given RNG seed
    pub fn new(seed: u32) -> Self {
        Self {
            board: Board::new(),
            active: None,
            next: None,
            rng: SimpleRng::new(seed),
            seed,
            phase: Phase::Idle,
            paused: false,
            pending_clear: FullRows::new(),
            score: 0,
            level: 1,
            lines: 0,
            piece_id: 0,
            events: Vec::new(),
        }
    }

    /// Reset board and counters and spawn a fresh piece pair.
    ///
    /// Works from any phase, so it doubles as restart.
    pub fn start(&mut self) {
        self.reset(Board::new(), None);
    }

    /// Start a game from a prepared board with a chosen first piece.
    ///
    /// The board is taken as-is; rows that are already complete are not
    /// cleared until the next lock-in.
    pub fn start_from(&mut self, board: Board, first: PieceKind) {
        self.start_from_lines(board, first, 0);
    }

    /// Like [`GameState::start_from`], with `lines` already counted. The
    /// level follows the line count; the score starts at zero.
    pub fn start_from_lines(&mut self, board: Board, first: PieceKind, lines: u32) {
        self.reset(board, Some(first));
        self.lines = lines;
        self.level = calculate_level(lines);
    }

    fn reset(&mut self, board: Board, first: Option<PieceKind>) {
        self.events.clear();
        self.board = board;
        self.active = None;
        self.next = first;
        self.phase = Phase::Running;
        self.paused = false;
        self.pending_clear.clear();
        self.score = 0;
        self.level = 1;
        self.lines = 0;
        self.piece_id = 0;

        info!(seed = self.seed, "game started");
        self.record(GameEvent::Started);
        self.spawn_next_piece();
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether a game is in progress (paused games included)
    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// Whether completed rows are waiting to be removed
    pub fn is_clearing(&self) -> bool {
        !self.pending_clear.is_empty()
    }

    /// Rows waiting to be removed, bottom to top
    pub fn clearing_rows(&self) -> &[usize] {
        &self.pending_clear
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn lines(&self) -> u32 {
        self.lines
    }

    pub fn piece_id(&self) -> u32 {
        self.piece_id
    }

    pub fn active(&self) -> Option<Tetromino> {
        self.active
    }

    pub fn next_piece(&self) -> Option<PieceKind> {
        self.next
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Gravity period for the current level
    pub fn gravity_interval_ms(&self) -> u32 {
        gravity_interval_ms(self.level)
    }

    /// Take every event recorded since the previous call.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn record(&mut self, event: GameEvent) {
        if self.events.len() >= EVENT_BACKLOG {
            self.events.drain(..EVENT_BACKLOG / 2);
        }
        self.events.push(event);
    }

    /// Board with the active piece drawn on top (only while a game runs).
    pub fn display_board(&self) -> Grid {
        project(&self.board, self.overlay())
    }

    fn overlay(&self) -> Option<&Tetromino> {
        if self.is_running() {
            self.active.as_ref()
        } else {
            None
        }
    }

    pub fn snapshot_into(&self, out: &mut GameSnapshot) {
        project_into(&self.board, self.overlay(), &mut out.board);
        out.phase = self.phase;
        out.paused = self.paused;
        out.score = self.score;
        out.level = self.level;
        out.lines = self.lines;
        out.next = self.next;
        out.clearing_rows = row_mask(&self.pending_clear);
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let mut s = GameSnapshot::default();
        self.snapshot_into(&mut s);
        s
    }

    /// Suppress gravity and input. Returns false if nothing changed.
    pub fn pause(&mut self) -> bool {
        if self.paused || !self.is_running() {
            return false;
        }
        self.paused = true;
        self.record(GameEvent::Paused);
        true
    }

    /// Returns false if the game was not paused.
    pub fn resume(&mut self) -> bool {
        if !self.paused {
            return false;
        }
        self.paused = false;
        self.record(GameEvent::Resumed);
        true
    }

    /// The active piece, if the piece may currently be moved.
    fn movable(&self) -> Option<Tetromino> {
        if !self.is_running() || self.paused || self.is_clearing() {
            return None;
        }
        self.active
    }

    /// Try to shift the active piece; illegal shifts leave it where it is.
    fn try_shift(&mut self, dx: i8, dy: i8) -> bool {
        let Some(active) = self.movable() else {
            return false;
        };

        if !active.is_valid_placement(&self.board, dx, dy, None) {
            return false;
        }
        self.active = Some(Tetromino {
            x: active.x + dx,
            y: active.y + dy,
            ..active
        });
        true
    }

    pub fn move_left(&mut self) -> bool {
        self.try_shift(-1, 0)
    }

    pub fn move_right(&mut self) -> bool {
        self.try_shift(1, 0)
    }

    /// Move the active piece down one row, locking it in if it cannot fall.
    ///
    /// Gravity and hard drop both go through here.
    pub fn move_down(&mut self) -> StepOutcome {
        if self.movable().is_none() {
            return StepOutcome::Ignored;
        }
        if self.try_shift(0, 1) {
            StepOutcome::Moved
        } else {
            self.lock_in();
            StepOutcome::Locked
        }
    }

    /// Rotate clockwise in place. There are no wall kicks: if the rotated grid
    /// does not fit at the current position the orientation stays as it was.
    pub fn rotate(&mut self) -> bool {
        let Some(active) = self.movable() else {
            return false;
        };

        let rotated = rotate_clockwise(&active.shape);
        if !active.is_valid_placement(&self.board, 0, 0, Some(&rotated)) {
            return false;
        }
        self.active = Some(Tetromino {
            shape: rotated,
            ..active
        });
        true
    }

    /// Drop the active piece to its landing row and lock it.
    /// Returns the number of rows fallen.
    pub fn hard_drop(&mut self) -> u32 {
        let mut distance = 0;
        while self.move_down() == StepOutcome::Moved {
            distance += 1;
        }
        distance
    }

    /// Merge the active piece into the board, then either flag completed rows
    /// or spawn the next piece straight away.
    fn lock_in(&mut self) {
        let Some(piece) = self.active.take() else {
            return;
        };

        for (x, y) in piece.cells() {
            // Minos above the field never touch the grid
            if y >= 0 {
                self.board.set(x, y, Some(piece.kind));
            }
        }
        debug!(kind = piece.kind.as_str(), x = piece.x, y = piece.y, "piece locked");
        self.record(GameEvent::PieceLocked { kind: piece.kind });

        let full = self.board.full_rows();
        if full.is_empty() {
            self.spawn_next_piece();
            return;
        }

        debug!(rows = ?full.as_slice(), "rows complete");
        self.record(GameEvent::LineClearStarted {
            rows: row_mask(&full),
        });
        self.pending_clear = full;
    }

    /// Remove the flagged rows, commit score/lines/level and spawn the next
    /// piece. Does nothing when no clear is pending.
    pub fn complete_line_clear(&mut self) -> bool {
        if self.pending_clear.is_empty() {
            return false;
        }

        let rows = std::mem::take(&mut self.pending_clear);
        self.board.remove_rows(&rows);

        let count = rows.len();
        let points = calculate_line_score(count, self.level);
        self.lines += count as u32;
        self.score = self.score.saturating_add(points);
        self.record(GameEvent::LinesCleared {
            count: count as u8,
            points,
        });

        let level = calculate_level(self.lines);
        if level != self.level {
            self.level = level;
            info!(level, lines = self.lines, "level up");
            self.record(GameEvent::LevelChanged { level });
        }

        if self.is_running() {
            self.spawn_next_piece();
        }
        true
    }

    /// Promote the next piece (or a fresh random one on the first spawn of a
    /// game) and draw a new next piece. Ends the game if the spawn collides.
    pub fn spawn_next_piece(&mut self) -> bool {
        let kind = self
            .next
            .take()
            .unwrap_or_else(|| random_piece(&mut self.rng));
        self.next = Some(random_piece(&mut self.rng));

        let piece = Tetromino::new(kind);
        if !piece.is_valid_placement(&self.board, 0, 0, None) {
            self.game_over();
            return false;
        }

        self.active = Some(piece);
        self.piece_id = self.piece_id.wrapping_add(1);
        self.record(GameEvent::PieceSpawned { kind });
        true
    }

    fn game_over(&mut self) {
        self.phase = Phase::GameOver;
        self.active = None;
        info!(score = self.score, lines = self.lines, level = self.level, "game over");
        self.record(GameEvent::GameOver { score: self.score });
    }

    /// Apply a game action. Lifecycle actions are handled too; `Start` resets.
    pub fn apply_action(&mut self, action: GameAction) -> bool {
        match action {
            GameAction::MoveLeft => self.move_left(),
            GameAction::MoveRight => self.move_right(),
            GameAction::MoveDown => self.move_down() != StepOutcome::Ignored,
            GameAction::Rotate => self.rotate(),
            GameAction::HardDrop => {
                let spawned_before = self.piece_id;
                self.hard_drop();
                spawned_before != self.piece_id || self.is_clearing() || self.is_game_over()
            }
            GameAction::Start => {
                self.start();
                true
            }
            GameAction::Pause => self.pause(),
            GameAction::Resume => self.resume(),
            GameAction::TogglePause => {
                if self.paused {
                    self.resume()
                } else {
                    self.pause()
                }
            }
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(1)
    }
}
