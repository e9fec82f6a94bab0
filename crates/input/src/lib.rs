//! Terminal input module (engine-facing).
//!
//! This module is intentionally independent of any UI framework. It maps
//! `crossterm` key events into [`crate::types::GameAction`] and decides which
//! actions may reach the engine in the current phase.

pub mod gate;
pub mod map;

pub use blockfall_types as types;

pub use gate::permitted;
pub use map::{handle_key_event, should_quit};
