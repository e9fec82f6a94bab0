//! Terminal "game renderer" module.
//!
//! This is a small, game-oriented rendering layer for terminal gameplay.
//! It avoids widget toolkits and instead renders a [`GameSnapshot`] into a
//! simple framebuffer that is diffed and flushed through crossterm.
//!
//! Goals:
//! - Keep `core` free of any presentation concern
//! - Allow precise control over aspect ratio (2 chars wide per cell)
//!
//! [`GameSnapshot`]: blockfall_core::GameSnapshot

pub mod fb;
pub mod game_view;
pub mod renderer;

pub use blockfall_core as core;
pub use blockfall_types as types;

pub use fb::{Cell, CellStyle, FrameBuffer, Rgb};
pub use game_view::{piece_color, GameView, Viewport};
pub use renderer::{encode_diff_into, encode_full_into, TerminalRenderer};
