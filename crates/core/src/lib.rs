//! Core game logic module - pure, deterministic, and testable
//!
//! This crate contains all the game rules and state management. It has no
//! notion of time, terminals or threads, which keeps it:
//!
//! - **Deterministic**: Same seed produces identical piece sequences
//! - **Testable**: Every rule can be driven step by step from a unit test
//! - **Portable**: The same state drives the terminal frontend and headless runs
//!
//! # Module Structure
//!
//! - [`board`]: 10x20 playfield, row checks and row removal
//! - [`game_state`]: Active piece, lock-in, the deferred line clear and the lifecycle
//! - [`pieces`]: Tetromino templates and plain clockwise matrix rotation
//! - [`rng`]: Seeded uniform piece selection
//! - [`scoring`]: Line clear points, levels and gravity periods
//! - [`snapshot`]: Read-only projections for presentation
//!
//! # Game Rules
//!
//! - **Uniform randomizer**: each spawn picks one of seven kinds with probability 1/7
//! - **No wall kicks**: a rotation that does not fit in place is dropped
//! - **Deferred clear**: completed rows stay on the board until
//!   [`GameState::complete_line_clear`] is called
//! - **Scoring**: 40/100/300/1200 times the level at the moment of the clear
//!
//! # Example
//!
//! ```
//! use blockfall_core::GameState;
//! use blockfall_types::GameAction;
//!
//! let mut game = GameState::new(12345);
//! game.start();
//!
//! game.apply_action(GameAction::MoveRight);
//! game.apply_action(GameAction::Rotate);
//! game.apply_action(GameAction::HardDrop);
//!
//! // A single piece never completes a row on an empty board
//! assert_eq!(game.score(), 0);
//! assert_eq!(game.board().filled_count(), 4);
//! ```
//!
//! # Timing
//!
//! Gravity and the line clear delay are driven from outside: the engine crate
//! calls [`GameState::move_down`] every [`GameState::gravity_interval_ms`]
//! and [`GameState::complete_line_clear`] 500ms after rows were flagged.
//! Events pile up until [`GameState::take_events`] is called; a state that is
//! never drained keeps only the latest [`EVENT_BACKLOG`] of them.

pub mod board;
pub mod game_state;
pub mod pieces;
pub mod rng;
pub mod scoring;
pub mod snapshot;

pub use blockfall_types as types;

// Re-export commonly used types for convenience
pub use board::{Board, FullRows, Grid};
pub use game_state::{GameState, StepOutcome, Tetromino, EVENT_BACKLOG};
pub use pieces::{rotate_clockwise, template, Shape};
pub use rng::{random_piece, SimpleRng};
pub use scoring::{calculate_level, calculate_line_score, gravity_interval_ms};
pub use snapshot::{project, project_into, GameSnapshot};
