//! Countdown state structure and transitions

use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Lifecycle phase of a countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountdownPhase {
    Idle,
    Running,
    Cancelled,
    Finished,
}

impl CountdownPhase {
    /// Terminal phases have no outgoing transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Finished)
    }
}

/// Outcome of feeding a tick into the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Remaining time moved forward
    Updated(Duration),
    /// Remaining time reached zero, the countdown is now finished
    Finished,
    /// Tick arrived in a terminal phase or did not decrease the remaining time
    Ignored,
}

/// Remaining time handed across a save/restore boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedCountdown {
    pub remaining_millis: u64,
}

impl SavedCountdown {
    pub fn remaining(&self) -> Duration {
        Duration::from_millis(self.remaining_millis)
    }
}

impl From<Duration> for SavedCountdown {
    fn from(remaining: Duration) -> Self {
        Self {
            remaining_millis: remaining.as_millis() as u64,
        }
    }
}

/// Countdown state: remaining time plus the two mutually exclusive terminal flags
#[derive(Debug, Clone)]
pub struct CountdownState {
    remaining: Duration,
    cancelled: bool,
    finished: bool,
    running: bool,
}

impl CountdownState {
    /// Create an idle countdown with the given remaining time
    pub fn new(remaining: Duration) -> Self {
        Self {
            remaining,
            cancelled: false,
            finished: false,
            running: false,
        }
    }

    /// Restore an idle countdown from saved state
    pub fn restore(saved: SavedCountdown) -> Self {
        Self::new(saved.remaining())
    }

    pub fn phase(&self) -> CountdownPhase {
        if self.finished {
            CountdownPhase::Finished
        } else if self.cancelled {
            CountdownPhase::Cancelled
        } else if self.running {
            CountdownPhase::Running
        } else {
            CountdownPhase::Idle
        }
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_terminal(&self) -> bool {
        self.phase().is_terminal()
    }

    pub fn save(&self) -> SavedCountdown {
        SavedCountdown::from(self.remaining)
    }

    /// Begin (or restart) running from `remaining`. Returns false in a terminal phase.
    pub fn begin(&mut self, remaining: Duration) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.remaining = remaining;
        self.running = true;
        true
    }

    /// Stop running without entering a terminal phase (transient teardown)
    pub fn pause(&mut self) {
        self.running = false;
    }

    /// Apply a tick reporting `remaining` time left
    pub fn tick(&mut self, remaining: Duration) -> TickOutcome {
        if !self.running || self.is_terminal() {
            return TickOutcome::Ignored;
        }
        if remaining.is_zero() {
            return if self.finish() {
                TickOutcome::Finished
            } else {
                TickOutcome::Ignored
            };
        }
        if remaining >= self.remaining {
            return TickOutcome::Ignored;
        }
        self.remaining = remaining;
        TickOutcome::Updated(remaining)
    }

    /// Enter the finished phase. Returns true only on the first transition.
    pub fn finish(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.remaining = Duration::ZERO;
        self.finished = true;
        self.running = false;
        true
    }

    /// Enter the cancelled phase. Returns true only on the first transition.
    pub fn cancel(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        self.cancelled = true;
        self.running = false;
        true
    }
}
