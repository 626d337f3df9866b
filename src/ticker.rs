use std::time::Duration;

/// Default event poll interval in milliseconds
pub const DEFAULT_TICK_MS: u64 = 250;

/// Countdown resolution: one timer tick per second of wall-clock time
pub const COUNTDOWN_TICK_MS: i64 = 1000;

/// Get event poll duration
pub fn tick_duration() -> Duration {
    Duration::from_millis(DEFAULT_TICK_MS)
}

/// A cancellable recurring one-second schedule, expressed in clock milliseconds.
///
/// The schedule holds at most one pending tick. Each tick is handed out by
/// [`TickSchedule::take_due`] only once, and the following one is scheduled only
/// after that, so deliveries can never overlap or repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSchedule {
    next_due: Option<i64>,
}

impl TickSchedule {
    /// Schedule the first tick one interval after `now`, replacing any pending tick
    pub fn start_at(&mut self, now: i64) {
        self.next_due = Some(now + COUNTDOWN_TICK_MS);
    }

    /// Drop the pending tick, if any
    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn is_scheduled(&self) -> bool {
        self.next_due.is_some()
    }

    /// Consume the pending tick if it is due at `now` and queue the next one
    pub fn take_due(&mut self, now: i64) -> bool {
        match self.next_due {
            Some(due) if due <= now => {
                self.next_due = Some(due + COUNTDOWN_TICK_MS);
                true
            }
            _ => false,
        }
    }
}
