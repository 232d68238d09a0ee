//! Background continuation unit
//!
//! Keeps an emergency countdown alive without a screen: the place-call
//! trigger is scheduled for the end of the countdown and the warning sound
//! keeps playing until the unit is stopped.

use std::{sync::{Arc, Mutex}, time::Duration};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::services::WarningSound;
use super::triggers::{new_call_emergency_trigger, new_cancel_countdown_trigger, AlarmScheduler, TriggerHandle};

/// A background execution unit that can be told to stop
pub trait BackgroundUnit: Send + Sync {
    fn stop(&self);
    fn is_running(&self) -> bool;
}

/// Snapshot of the background unit for status reporting
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStatus {
    pub running: bool,
    pub call_at: Option<DateTime<Utc>>,
    /// Handle a notification action fires to cancel the countdown
    pub cancel_trigger: TriggerHandle,
}

/// Background countdown unit
pub struct EmergencyActionService {
    scheduler: Arc<dyn AlarmScheduler>,
    sound: Arc<WarningSound>,
    call_at: Mutex<Option<DateTime<Utc>>>,
}

impl EmergencyActionService {
    pub fn new(scheduler: Arc<dyn AlarmScheduler>, sound: Arc<WarningSound>) -> Self {
        Self {
            scheduler,
            sound,
            call_at: Mutex::new(None),
        }
    }

    /// Continue a countdown with `remaining` time left in the background
    pub fn start(&self, remaining: Duration) -> Result<(), String> {
        let mut call_at = self.call_at.lock()
            .map_err(|e| format!("Failed to lock service state: {}", e))?;

        let delta = chrono::Duration::from_std(remaining)
            .map_err(|e| format!("Invalid countdown duration: {}", e))?;
        self.scheduler.schedule(&new_call_emergency_trigger(), remaining);
        self.sound.start();
        *call_at = Some(Utc::now() + delta);

        info!("Emergency countdown continuing in background, call in {}ms", remaining.as_millis());
        Ok(())
    }

    pub fn status(&self) -> ServiceStatus {
        let call_at = self.call_at.lock().ok().and_then(|c| *c);
        ServiceStatus {
            running: call_at.is_some(),
            call_at,
            cancel_trigger: new_cancel_countdown_trigger(),
        }
    }
}

impl BackgroundUnit for EmergencyActionService {
    fn stop(&self) {
        let was_running = match self.call_at.lock() {
            Ok(mut call_at) => call_at.take().is_some(),
            Err(e) => {
                error!("Failed to lock service state: {}", e);
                return;
            }
        };

        if was_running {
            self.sound.stop();
            info!("Background emergency countdown stopped");
        } else {
            debug!("Background emergency countdown not running");
        }
    }

    fn is_running(&self) -> bool {
        self.call_at.lock().map(|c| c.is_some()).unwrap_or(false)
    }
}
