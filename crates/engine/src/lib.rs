//! Game loop for the rules core.
//!
//! [`Engine`] owns a [`GameState`](blockfall_core::GameState), a virtual-clock
//! [`Scheduler`] with the gravity and line-clear timers, and a list of
//! listeners. Frontends call commands and feed elapsed time through
//! [`Engine::advance`]; tests do the same with exact millisecond steps.
//!
//! ```
//! use blockfall_engine::Engine;
//!
//! let mut engine = Engine::new(42);
//! engine.start_game();
//! assert_eq!(engine.gravity_timer_count(), 1);
//!
//! engine.advance(1000); // one gravity step at level 1
//! assert!(engine.is_running());
//! ```

pub mod config;
pub mod engine;
pub mod scheduler;

pub use blockfall_core as core;
pub use blockfall_types as types;

pub use config::{Config, ConfigError};
pub use engine::{Engine, Listener};
pub use scheduler::{Fired, Scheduler, TimerId, TimerKind};
