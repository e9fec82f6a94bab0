//! Virtual-clock timer scheduler.
//!
//! The scheduler never looks at a wall clock. Its owner feeds it elapsed
//! milliseconds and pulls due timers one at a time with [`Scheduler::pop_due`],
//! so every firing runs to completion before the next one is considered and
//! timers added or cancelled from inside a firing take effect immediately.

use tracing::trace;

/// Logical loop a timer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Periodic downward step of the active piece
    Gravity,
    /// One-shot removal of flagged rows
    LineClear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

/// A timer that has come due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub kind: TimerKind,
    /// Clock value the timer fired at
    pub at: u64,
}

#[derive(Debug, Clone)]
struct Timer {
    id: TimerId,
    kind: TimerKind,
    due: u64,
    /// `None` for one-shot timers
    period: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    now: u64,
    next_id: u64,
    timers: Vec<Timer>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current clock value in milliseconds
    pub fn now(&self) -> u64 {
        self.now
    }

    fn insert(&mut self, kind: TimerKind, delay: u64, period: Option<u64>) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            kind,
            due: self.now + delay,
            period,
        });
        trace!(?kind, delay, now = self.now, "timer scheduled");
        id
    }

    /// Fire `kind` every `period` ms, first at `now + period`.
    ///
    /// A zero period is treated as 1ms so the clock always makes progress.
    pub fn schedule_repeating(&mut self, kind: TimerKind, period: u64) -> TimerId {
        let period = period.max(1);
        self.insert(kind, period, Some(period))
    }

    /// Fire `kind` once at `now + delay`.
    pub fn schedule_once(&mut self, kind: TimerKind, delay: u64) -> TimerId {
        self.insert(kind, delay, None)
    }

    /// Remove a timer. Returns false if it already fired (one-shot) or was
    /// cancelled before.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        self.timers.len() != before
    }

    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.timers.iter().any(|t| t.id == id)
    }

    /// Number of live timers of a kind
    pub fn count(&self, kind: TimerKind) -> usize {
        self.timers.iter().filter(|t| t.kind == kind).count()
    }

    /// Pop the earliest timer due at or before `deadline`.
    ///
    /// The clock moves to the firing time. Repeating timers are re-armed one
    /// period later; one-shot timers are removed. Ties fire in scheduling order.
    pub fn pop_due(&mut self, deadline: u64) -> Option<Fired> {
        let (idx, _) = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= deadline)
            .min_by_key(|(_, t)| (t.due, t.id))?;

        let timer = &mut self.timers[idx];
        let fired = Fired {
            kind: timer.kind,
            at: timer.due,
        };
        match timer.period {
            Some(period) => timer.due += period,
            None => {
                self.timers.swap_remove(idx);
            }
        }

        self.now = self.now.max(fired.at);
        Some(fired)
    }

    /// Move the clock to `deadline` once every due timer has been popped.
    pub fn settle(&mut self, deadline: u64) {
        debug_assert!(
            self.timers.iter().all(|t| t.due > deadline),
            "settling past a due timer"
        );
        self.now = self.now.max(deadline);
    }
}
