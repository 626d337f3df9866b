use crate::clock::Clock;
use crate::domain::{TimerContext, TimerStatus};
use crate::ticker::TickSchedule;
use crate::time_utils::calculate_fill_percentage;
use std::rc::Rc;
use tracing::{debug, info};

/// What a call to [`TimerEngine::poll`] did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollOutcome {
    /// Number of one-second ticks applied
    pub ticks: u32,
    /// The countdown reached zero during this poll
    pub completed: bool,
}

/// Countdown timer with session tracking.
///
/// A session starts whenever the timer is started from full time or from the
/// complete state; resuming a pause continues the current session. Ticks are
/// delivered by [`TimerEngine::poll`] from a [`TickSchedule`] that every
/// transition out of `Running` cancels, so dropping or stopping the engine never
/// leaves a countdown behind.
pub struct TimerEngine {
    clock: Rc<dyn Clock>,
    initial_time: u32,
    time_remaining: u32,
    status: TimerStatus,
    session_id: u64,
    session_start_time: Option<i64>,
    schedule: TickSchedule,
}

impl TimerEngine {
    pub fn new(initial_time: u32, clock: Rc<dyn Clock>) -> Self {
        Self {
            clock,
            initial_time,
            time_remaining: initial_time,
            status: TimerStatus::Idle,
            session_id: 0,
            session_start_time: None,
            schedule: TickSchedule::default(),
        }
    }

    /// Start or resume the countdown
    pub fn start(&mut self) {
        if !self.status.can_start() {
            return;
        }

        let now = self.clock.now();
        if self.status == TimerStatus::Complete || self.time_remaining == self.initial_time {
            self.session_id += 1;
            self.session_start_time = Some(now);
            info!(session_id = self.session_id, seconds = self.time_remaining, "Focus session started");
        } else {
            debug!(session_id = self.session_id, remaining = self.time_remaining, "Timer resumed");
        }

        if self.status == TimerStatus::Complete {
            // Restarting after completion counts down the full duration again
            self.time_remaining = self.initial_time;
        }

        self.status = TimerStatus::Running;
        self.schedule.start_at(now);
    }

    /// Pause a running countdown
    pub fn pause(&mut self) {
        if self.status == TimerStatus::Running {
            self.schedule.cancel();
            self.status = TimerStatus::Paused;
            debug!(remaining = self.time_remaining, "Timer paused");
        }
    }

    /// Stop and go back to the full duration. Keeps the session counter.
    pub fn reset(&mut self) {
        self.schedule.cancel();
        self.status = TimerStatus::Idle;
        self.time_remaining = self.initial_time;
        debug!(seconds = self.initial_time, "Timer reset");
    }

    /// Change the duration (preset or custom). Stops the timer; keeps the session counter.
    pub fn set_time(&mut self, seconds: u32) {
        self.schedule.cancel();
        self.status = TimerStatus::Idle;
        self.initial_time = seconds;
        self.time_remaining = seconds;
        debug!(seconds, "Timer duration changed");
    }

    /// Deliver every tick that is due by now, one at a time
    pub fn poll(&mut self) -> PollOutcome {
        let now = self.clock.now();
        let mut outcome = PollOutcome::default();

        while self.status == TimerStatus::Running && self.schedule.take_due(now) {
            outcome.ticks += 1;
            if self.tick() {
                outcome.completed = true;
            }
        }

        outcome
    }

    /// Apply one tick. Returns true when this tick completed the countdown.
    fn tick(&mut self) -> bool {
        if self.status != TimerStatus::Running {
            return false;
        }

        if self.time_remaining <= 1 {
            self.time_remaining = 0;
            self.status = TimerStatus::Complete;
            self.schedule.cancel();
            info!(session_id = self.session_id, "Focus session complete");
            return true;
        }

        self.time_remaining -= 1;
        false
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn initial_time(&self) -> u32 {
        self.initial_time
    }

    pub fn status(&self) -> TimerStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    pub fn is_complete(&self) -> bool {
        self.status == TimerStatus::Complete
    }

    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    pub fn session_start_time(&self) -> Option<i64> {
        self.session_start_time
    }

    /// Whether a tick is pending
    pub fn has_pending_tick(&self) -> bool {
        self.schedule.is_scheduled()
    }

    pub fn fill_percentage(&self) -> f64 {
        calculate_fill_percentage(self.time_remaining as i64, self.initial_time as i64)
    }

    /// Timer state as seen by the task store at completion time
    pub fn context(&self) -> TimerContext {
        TimerContext {
            is_active: self.is_running(),
            session_id: self.session_id,
            session_start_time: self.session_start_time,
        }
    }
}
