//! The game loop: a [`GameState`] driven by virtual-clock timers.
//!
//! Every command and every timer firing runs to completion on the caller's
//! thread. Afterwards the events the core recorded are drained, used to keep
//! the timers in step with the state (clear delay, gravity period, game over)
//! and handed to subscribed listeners.

use tracing::{debug, info};

use crate::core::{Board, GameSnapshot, GameState, Grid, StepOutcome};
use crate::scheduler::{Fired, Scheduler, TimerId, TimerKind};
use crate::types::{GameAction, GameEvent, PieceKind, LINE_CLEAR_DELAY_MS};

/// Observer callback. Receives each event together with the state right after
/// the whole command (or timer firing) that produced it.
///
/// Events are delivered in batches once that command finishes, so the state
/// is the same for every event of a batch. During a hard drop the
/// `LineClearStarted` event arrives with the state after the drop, not the
/// state at the moment the rows were flagged. Read per-event data from the
/// event itself.
pub type Listener = Box<dyn FnMut(&GameEvent, &GameState)>;

pub struct Engine {
    game: GameState,
    scheduler: Scheduler,
    gravity: Option<TimerId>,
    /// Period the live gravity timer was scheduled with
    gravity_period: u32,
    line_clear: Option<TimerId>,
    listeners: Vec<Listener>,
}

impl Engine {
    pub fn new(seed: u32) -> Self {
        Self {
            game: GameState::new(seed),
            scheduler: Scheduler::new(),
            gravity: None,
            gravity_period: 0,
            line_clear: None,
            listeners: Vec::new(),
        }
    }

    /// Register an observer for every subsequent event.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&GameEvent, &GameState) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    // ---- commands ----

    /// Start (or restart) a game: stale timers are cancelled before the reset
    /// and exactly one gravity timer runs afterwards.
    pub fn start_game(&mut self) {
        self.cancel_timers();
        self.game.start();
        self.arm_gravity();
        self.dispatch();
    }

    /// Start from a prepared board with a chosen first piece.
    pub fn start_game_from(&mut self, board: Board, first: PieceKind) {
        self.start_game_from_lines(board, first, 0);
    }

    /// Start from a prepared board with `lines` already counted, so gravity
    /// begins at that line count's level.
    pub fn start_game_from_lines(&mut self, board: Board, first: PieceKind, lines: u32) {
        self.cancel_timers();
        self.game.start_from_lines(board, first, lines);
        self.arm_gravity();
        self.dispatch();
    }

    pub fn pause_game(&mut self) {
        self.game.pause();
        self.dispatch();
    }

    pub fn resume_game(&mut self) {
        self.game.resume();
        self.dispatch();
    }

    pub fn toggle_pause(&mut self) {
        if self.game.is_paused() {
            self.resume_game();
        } else {
            self.pause_game();
        }
    }

    pub fn move_left(&mut self) {
        self.game.move_left();
        self.dispatch();
    }

    pub fn move_right(&mut self) {
        self.game.move_right();
        self.dispatch();
    }

    pub fn move_down(&mut self) -> StepOutcome {
        let outcome = self.game.move_down();
        self.dispatch();
        outcome
    }

    pub fn rotate(&mut self) {
        self.game.rotate();
        self.dispatch();
    }

    pub fn hard_drop(&mut self) {
        self.game.hard_drop();
        self.dispatch();
    }

    /// Apply an input action. Returns whether the state changed.
    pub fn apply(&mut self, action: GameAction) -> bool {
        if action == GameAction::Start {
            self.start_game();
            return true;
        }
        let changed = self.game.apply_action(action);
        self.dispatch();
        changed
    }

    /// Let `elapsed_ms` of time pass, firing every timer that comes due.
    pub fn advance(&mut self, elapsed_ms: u64) {
        let deadline = self.scheduler.now() + elapsed_ms;
        while let Some(fired) = self.scheduler.pop_due(deadline) {
            self.on_timer(fired);
            self.dispatch();
        }
        self.scheduler.settle(deadline);
    }

    fn on_timer(&mut self, fired: Fired) {
        match fired.kind {
            TimerKind::Gravity => {
                // Paused games keep the timer but skip the step
                if !self.game.is_paused() {
                    self.game.move_down();
                }
            }
            TimerKind::LineClear => {
                self.line_clear = None;
                debug!(at = fired.at, "line clear delay elapsed");
                self.game.complete_line_clear();
            }
        }
    }

    // ---- timer coordination ----

    fn arm_gravity(&mut self) {
        if let Some(id) = self.gravity.take() {
            self.scheduler.cancel(id);
        }
        if !self.game.is_running() {
            return;
        }
        self.gravity_period = self.game.gravity_interval_ms();
        self.gravity = Some(
            self.scheduler
                .schedule_repeating(TimerKind::Gravity, self.gravity_period as u64),
        );
        debug!(period_ms = self.gravity_period, "gravity armed");
    }

    fn cancel_timers(&mut self) {
        if let Some(id) = self.gravity.take() {
            self.scheduler.cancel(id);
        }
        if let Some(id) = self.line_clear.take() {
            self.scheduler.cancel(id);
        }
    }

    fn dispatch(&mut self) {
        let events = self.game.take_events();
        if events.is_empty() {
            return;
        }

        for event in &events {
            match *event {
                GameEvent::LineClearStarted { .. } => {
                    if let Some(id) = self.line_clear.take() {
                        self.scheduler.cancel(id);
                    }
                    self.line_clear = Some(
                        self.scheduler
                            .schedule_once(TimerKind::LineClear, LINE_CLEAR_DELAY_MS as u64),
                    );
                }
                GameEvent::LevelChanged { level } => {
                    if self.gravity.is_some()
                        && self.game.gravity_interval_ms() != self.gravity_period
                    {
                        self.arm_gravity();
                        info!(level, period_ms = self.gravity_period, "gravity sped up");
                    }
                }
                GameEvent::GameOver { .. } => self.cancel_timers(),
                _ => {}
            }
        }

        for event in &events {
            for listener in self.listeners.iter_mut() {
                listener(event, &self.game);
            }
        }
    }

    // ---- queries ----

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn snapshot(&self) -> GameSnapshot {
        self.game.snapshot()
    }

    pub fn snapshot_into(&self, out: &mut GameSnapshot) {
        self.game.snapshot_into(out);
    }

    pub fn display_board(&self) -> Grid {
        self.game.display_board()
    }

    pub fn score(&self) -> u32 {
        self.game.score()
    }

    pub fn level(&self) -> u32 {
        self.game.level()
    }

    pub fn lines(&self) -> u32 {
        self.game.lines()
    }

    pub fn is_running(&self) -> bool {
        self.game.is_running()
    }

    pub fn is_paused(&self) -> bool {
        self.game.is_paused()
    }

    pub fn is_game_over(&self) -> bool {
        self.game.is_game_over()
    }

    pub fn is_clearing(&self) -> bool {
        self.game.is_clearing()
    }

    pub fn clearing_rows(&self) -> &[usize] {
        self.game.clearing_rows()
    }

    pub fn next_piece(&self) -> Option<PieceKind> {
        self.game.next_piece()
    }

    pub fn gravity_interval_ms(&self) -> u32 {
        self.game.gravity_interval_ms()
    }

    /// Live gravity timers (at most one)
    pub fn gravity_timer_count(&self) -> usize {
        self.scheduler.count(TimerKind::Gravity)
    }

    pub fn line_clear_pending(&self) -> bool {
        self.scheduler.count(TimerKind::LineClear) > 0
    }

    /// Virtual clock in milliseconds
    pub fn now_ms(&self) -> u64 {
        self.scheduler.now()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(1)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("game", &self.game)
            .field("scheduler", &self.scheduler)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BOARD_HEIGHT, BOARD_WIDTH};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn fill_bottom_except_left(board: &mut Board, rows: usize) {
        for y in (BOARD_HEIGHT as usize - rows)..BOARD_HEIGHT as usize {
            for x in 1..BOARD_WIDTH as i8 {
                board.set(x, y as i8, Some(PieceKind::T));
            }
        }
    }

    /// Upright I dropped into column 0.
    fn drop_i_left(engine: &mut Engine) {
        engine.rotate();
        for _ in 0..5 {
            engine.move_left();
        }
        engine.hard_drop();
    }

    fn active_y(engine: &Engine) -> i8 {
        engine.game.active().map(|p| p.y).unwrap_or(i8::MIN)
    }

    #[test]
    fn test_start_schedules_single_gravity_timer() {
        let mut engine = Engine::new(7);
        assert_eq!(engine.gravity_timer_count(), 0);

        engine.start_game();
        assert_eq!(engine.gravity_timer_count(), 1);
        engine.start_game();
        assert_eq!(engine.gravity_timer_count(), 1);

        assert_eq!(engine.game.board().filled_count(), 0);
        assert_eq!(
            (engine.score(), engine.level(), engine.lines()),
            (0, 1, 0)
        );
    }

    #[test]
    fn test_restart_mid_game_resets() {
        let mut engine = Engine::new(7);
        engine.start_game();
        engine.hard_drop();
        engine.advance(3500);
        engine.start_game();

        assert_eq!(engine.game.board().filled_count(), 0);
        assert_eq!(engine.gravity_timer_count(), 1);
        assert!(!engine.line_clear_pending());

        // Only one step per period after the restart
        let y = active_y(&engine);
        engine.advance(1000);
        assert_eq!(active_y(&engine), y + 1);
    }

    #[test]
    fn test_gravity_follows_period() {
        let mut engine = Engine::new(1);
        engine.start_game_from(Board::new(), PieceKind::O);

        engine.advance(999);
        assert_eq!(active_y(&engine), 0);
        engine.advance(1);
        assert_eq!(active_y(&engine), 1);
        engine.advance(3000);
        assert_eq!(active_y(&engine), 4);
    }

    #[test]
    fn test_gravity_locks_piece() {
        let mut engine = Engine::new(1);
        engine.start_game_from(Board::new(), PieceKind::O);

        // 18 steps to the floor, the 19th locks
        engine.advance(19_000);
        assert_eq!(engine.game.board().filled_count(), 4);
        assert_eq!(engine.game.board().get(4, 19), Some(Some(PieceKind::O)));
    }

    #[test]
    fn test_pause_suppresses_gravity() {
        let mut engine = Engine::new(1);
        engine.start_game_from(Board::new(), PieceKind::T);
        engine.pause_game();

        let before = engine.display_board();
        engine.advance(5000);
        assert_eq!(engine.display_board(), before);
        // Timer keeps running while paused
        assert_eq!(engine.gravity_timer_count(), 1);

        engine.resume_game();
        engine.advance(1000);
        assert_eq!(active_y(&engine), 1);
    }

    #[test]
    fn test_line_clear_waits_for_delay() {
        let mut board = Board::new();
        fill_bottom_except_left(&mut board, 1);
        let mut engine = Engine::new(1);
        engine.start_game_from(board, PieceKind::I);

        drop_i_left(&mut engine);
        assert!(engine.is_clearing());
        assert_eq!(engine.clearing_rows(), &[19]);
        assert!(engine.line_clear_pending());

        engine.advance(499);
        assert!(engine.is_clearing());
        assert_eq!(engine.score(), 0);
        assert!(engine.game.active().is_none());

        engine.advance(1);
        assert!(!engine.is_clearing());
        assert_eq!(engine.score(), 40);
        assert_eq!(engine.lines(), 1);
        assert!(engine.game.active().is_some());
        assert!(!engine.line_clear_pending());
    }

    #[test]
    fn test_gravity_inert_during_clear() {
        let mut board = Board::new();
        fill_bottom_except_left(&mut board, 1);
        let mut engine = Engine::new(1);
        engine.start_game_from(board, PieceKind::I);

        engine.advance(800);
        drop_i_left(&mut engine);
        let clearing_board = engine.display_board();

        // Gravity fires at 1000 while the clear completes at 1300
        engine.advance(400);
        assert_eq!(engine.display_board(), clearing_board);
        assert!(engine.is_clearing());

        engine.advance(100);
        assert!(!engine.is_clearing());
        assert_eq!(engine.score(), 40);
    }

    #[test]
    fn test_clear_completes_while_paused() {
        let mut board = Board::new();
        fill_bottom_except_left(&mut board, 1);
        let mut engine = Engine::new(1);
        engine.start_game_from(board, PieceKind::I);

        drop_i_left(&mut engine);
        engine.pause_game();
        engine.advance(500);

        assert!(!engine.is_clearing());
        assert!(engine.is_paused());
        let y = active_y(&engine);
        engine.advance(2000);
        assert_eq!(active_y(&engine), y);
    }

    #[test]
    fn test_level_up_reschedules_gravity() {
        let mut board = Board::new();
        fill_bottom_except_left(&mut board, 2);
        let mut engine = Engine::new(1);
        engine.start_game_from_lines(board, PieceKind::I, 9);

        drop_i_left(&mut engine);
        engine.advance(500);

        assert_eq!(engine.level(), 2);
        assert_eq!(engine.score(), 100);
        assert_eq!(engine.gravity_interval_ms(), 900);
        assert_eq!(engine.gravity_timer_count(), 1);

        // Rescheduled at the clear (t=500), so the first new step is at 1400
        let y = active_y(&engine);
        engine.advance(899);
        assert_eq!(active_y(&engine), y);
        engine.advance(1);
        assert_eq!(active_y(&engine), y + 1);
    }

    #[test]
    fn test_prepared_line_count_sets_gravity() {
        let mut engine = Engine::new(1);
        engine.start_game_from_lines(Board::new(), PieceKind::O, 30);

        assert_eq!(engine.level(), 4);
        assert_eq!(engine.gravity_interval_ms(), 700);
        engine.advance(699);
        assert_eq!(active_y(&engine), 0);
        engine.advance(1);
        assert_eq!(active_y(&engine), 1);
    }

    #[test]
    fn test_listener_batch_shares_final_state() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut board = Board::new();
        fill_bottom_except_left(&mut board, 1);
        let mut engine = Engine::new(1);
        let sink = Rc::clone(&seen);
        engine.subscribe(move |event, game| {
            sink.borrow_mut().push((*event, game.is_clearing()));
        });

        engine.start_game_from(board, PieceKind::I);
        seen.borrow_mut().clear();
        drop_i_left(&mut engine);

        let seen = seen.borrow();
        let locked = seen
            .iter()
            .find(|(e, _)| matches!(e, GameEvent::PieceLocked { .. }))
            .unwrap();
        // The lock was recorded before the rows were flagged, yet it is
        // observed together with the clearing state.
        assert!(locked.1);
    }

    #[test]
    fn test_game_over_cancels_timers() {
        let mut board = Board::new();
        for x in 0..10 {
            board.set(x, 1, Some(PieceKind::Z));
        }
        let mut engine = Engine::new(1);
        engine.start_game_from(board, PieceKind::T);

        assert!(engine.is_game_over());
        assert_eq!(engine.gravity_timer_count(), 0);
        assert!(!engine.line_clear_pending());

        engine.start_game();
        assert!(engine.is_running());
        assert_eq!(engine.gravity_timer_count(), 1);
    }

    #[test]
    fn test_listeners_see_events_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut engine = Engine::new(1);
        let sink = Rc::clone(&seen);
        engine.subscribe(move |event, _| sink.borrow_mut().push(*event));

        engine.start_game_from(Board::new(), PieceKind::O);
        engine.pause_game();
        engine.resume_game();

        assert_eq!(
            *seen.borrow(),
            vec![
                GameEvent::Started,
                GameEvent::PieceSpawned {
                    kind: PieceKind::O
                },
                GameEvent::Paused,
                GameEvent::Resumed,
            ]
        );
    }

    #[test]
    fn test_listener_observes_deferred_clear() {
        let scores = Rc::new(RefCell::new(Vec::new()));
        let mut board = Board::new();
        fill_bottom_except_left(&mut board, 1);
        let mut engine = Engine::new(1);
        let sink = Rc::clone(&scores);
        engine.subscribe(move |event, game| {
            if let GameEvent::LinesCleared { points, .. } = event {
                sink.borrow_mut().push((*points, game.score()));
            }
        });

        engine.start_game_from(board, PieceKind::I);
        drop_i_left(&mut engine);
        assert!(scores.borrow().is_empty());

        engine.advance(500);
        assert_eq!(*scores.borrow(), vec![(40, 40)]);
    }

    #[test]
    fn test_apply_routes_actions() {
        let mut engine = Engine::new(3);
        assert!(engine.apply(GameAction::Start));
        assert!(engine.is_running());

        assert!(engine.apply(GameAction::TogglePause));
        assert!(engine.is_paused());
        assert!(!engine.apply(GameAction::MoveLeft));
        assert!(engine.apply(GameAction::TogglePause));
        assert!(engine.apply(GameAction::MoveLeft));
    }

    #[test]
    fn test_clock_advances_without_game() {
        let mut engine = Engine::new(1);
        engine.advance(250);
        assert_eq!(engine.now_ms(), 250);
        assert!(!engine.is_running());
    }
}
