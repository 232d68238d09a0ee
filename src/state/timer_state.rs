//! Published countdown status

use std::time::Duration;
use serde::{Deserialize, Serialize};

use super::CountdownPhase;

/// Countdown progress as seen by status watchers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownStatus {
    pub phase: CountdownPhase,
    pub remaining_millis: u64,
}

impl CountdownStatus {
    pub fn new(phase: CountdownPhase, remaining: Duration) -> Self {
        Self {
            phase,
            remaining_millis: remaining.as_millis() as u64,
        }
    }

    /// No countdown has run yet
    pub fn idle() -> Self {
        Self {
            phase: CountdownPhase::Idle,
            remaining_millis: 0,
        }
    }

    /// Whether a countdown is currently ticking
    pub fn is_active(&self) -> bool {
        self.phase == CountdownPhase::Running
    }
}

impl Default for CountdownStatus {
    fn default() -> Self {
        Self::idle()
    }
}
