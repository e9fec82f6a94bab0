//! Caller-side input gate.
//!
//! The rules core ignores moves made while paused or outside a running game,
//! but the frontend should not send them in the first place.

use crate::types::{GameAction, Phase};

/// Whether `action` may be forwarded to the engine in the given phase.
///
/// - Movement: only while running and not paused
/// - Pause toggling: only while running
/// - Start: always
pub fn permitted(action: GameAction, phase: Phase, paused: bool) -> bool {
    match action {
        GameAction::Start => true,
        GameAction::Pause | GameAction::Resume | GameAction::TogglePause => phase == Phase::Running,
        _ if action.is_movement() => phase == Phase::Running && !paused,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOVES: [GameAction; 5] = [
        GameAction::MoveLeft,
        GameAction::MoveRight,
        GameAction::MoveDown,
        GameAction::Rotate,
        GameAction::HardDrop,
    ];

    #[test]
    fn test_moves_only_while_playing() {
        for action in MOVES {
            assert!(permitted(action, Phase::Running, false), "{action:?}");
            assert!(!permitted(action, Phase::Running, true), "{action:?}");
            assert!(!permitted(action, Phase::Idle, false), "{action:?}");
            assert!(!permitted(action, Phase::GameOver, false), "{action:?}");
        }
    }

    #[test]
    fn test_pause_only_while_running() {
        assert!(permitted(GameAction::TogglePause, Phase::Running, false));
        assert!(permitted(GameAction::TogglePause, Phase::Running, true));
        assert!(!permitted(GameAction::TogglePause, Phase::Idle, false));
        assert!(!permitted(GameAction::TogglePause, Phase::GameOver, false));
    }

    #[test]
    fn test_start_always_allowed() {
        for phase in [Phase::Idle, Phase::Running, Phase::GameOver] {
            assert!(permitted(GameAction::Start, phase, false));
            assert!(permitted(GameAction::Start, phase, true));
        }
    }
}
