//! Countdown controller
//!
//! One state machine covering every flavour of the emergency countdown; the
//! flavour is picked with [`CountdownOptions`]. The controller is driven by
//! ticks from [`crate::tasks::countdown_timer`] and never blocks.

use std::{sync::Arc, time::Duration};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    services::{CountdownDisplay, EmergencyCaller, Screen, WarningSound},
    state::{CountdownPhase, CountdownState, SavedCountdown, TickOutcome},
};

/// Capability slots of the countdown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownOptions {
    /// Place the emergency call when the countdown finishes
    pub enable_call: bool,
    /// Play the warning sound while counting down
    pub enable_sound: bool,
    /// Accept the slide-to-cancel gesture
    pub enable_cancel_gesture: bool,
}

/// Drives the countdown display and performs the terminal action
pub struct CountdownController {
    options: CountdownOptions,
    tick_interval: Duration,
    state: CountdownState,
    display: Option<Arc<dyn CountdownDisplay>>,
    screen: Arc<dyn Screen>,
    caller: Arc<EmergencyCaller>,
    sound: Arc<WarningSound>,
}

impl CountdownController {
    pub fn new(
        options: CountdownOptions,
        tick_interval: Duration,
        state: CountdownState,
        screen: Arc<dyn Screen>,
        caller: Arc<EmergencyCaller>,
        sound: Arc<WarningSound>,
    ) -> Self {
        Self {
            options,
            tick_interval,
            state,
            display: None,
            screen,
            caller,
            sound,
        }
    }

    pub fn with_display(mut self, display: Arc<dyn CountdownDisplay>) -> Self {
        self.display = Some(display);
        self
    }

    pub fn detach_display(&mut self) {
        self.display = None;
    }

    pub fn options(&self) -> CountdownOptions {
        self.options
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn phase(&self) -> CountdownPhase {
        self.state.phase()
    }

    pub fn remaining(&self) -> Duration {
        self.state.remaining()
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Time until the next tick; the last one only waits for what is left
    pub fn next_delay(&self) -> Duration {
        self.tick_interval.min(self.state.remaining())
    }

    /// Start counting down from `initial_remaining`, restarting a running countdown
    pub fn start(&mut self, initial_remaining: Duration) -> bool {
        if self.state.is_running() {
            debug!("Restarting running countdown");
            if let Some(display) = &self.display {
                display.stop();
            }
        }
        if !self.state.begin(initial_remaining) {
            warn!("Countdown already {:?}, not starting", self.state.phase());
            return false;
        }

        if let Some(display) = &self.display {
            display.start(initial_remaining);
            display.show();
        }
        if self.options.enable_sound {
            self.sound.start();
        }

        info!("Emergency countdown started with {}ms remaining", initial_remaining.as_millis());
        true
    }

    pub fn on_tick(&mut self, remaining: Duration) {
        match self.state.tick(remaining) {
            TickOutcome::Updated(remaining) => {
                debug!("Countdown tick: {}ms remaining", remaining.as_millis());
                if let Some(display) = &self.display {
                    display.set_remaining(remaining);
                }
            }
            TickOutcome::Finished => self.run_finish_actions(),
            TickOutcome::Ignored => {
                debug!("Ignoring tick in phase {:?}", self.state.phase());
            }
        }
    }

    pub fn on_finish(&mut self) {
        if self.state.finish() {
            self.run_finish_actions();
        }
    }

    /// Cancel the countdown. Returns true only for the call that cancelled it.
    pub fn cancel(&mut self) -> bool {
        if !self.state.cancel() {
            return false;
        }
        if let Some(display) = &self.display {
            display.stop();
        }
        if self.options.enable_sound {
            self.sound.stop();
        }
        info!("Emergency countdown cancelled with {}ms remaining", self.state.remaining().as_millis());
        true
    }

    /// Slide-to-cancel gesture completed
    pub fn slide_complete(&mut self) -> bool {
        if !self.options.enable_cancel_gesture {
            warn!("Slide-to-cancel is not enabled, ignoring gesture");
            return false;
        }
        if self.cancel() {
            self.screen.close();
            true
        } else {
            debug!("Slide completed after countdown ended, ignoring");
            false
        }
    }

    /// Screen teardown: stop without cancelling and hand back the remaining time
    pub fn stop(&mut self) -> SavedCountdown {
        if self.state.is_running() {
            if let Some(display) = &self.display {
                display.stop();
            }
            self.state.pause();
            if self.options.enable_sound {
                self.sound.stop();
            }
            info!("Emergency countdown stopped with {}ms remaining", self.state.remaining().as_millis());
        }
        self.state.save()
    }

    pub fn save(&self) -> SavedCountdown {
        self.state.save()
    }

    fn run_finish_actions(&mut self) {
        info!("Emergency countdown finished");
        if let Some(display) = &self.display {
            display.stop();
        }
        if self.options.enable_sound {
            self.sound.stop();
        }
        if self.options.enable_call {
            self.caller.place_emergency_call();
        }
        self.screen.close();
    }
}
