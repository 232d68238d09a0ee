//! Receiver for background emergency signals

use std::sync::Arc;
use tracing::{info, warn};

use crate::services::{CallOutcome, EmergencyCaller};
use super::{
    service::BackgroundUnit,
    triggers::{new_call_emergency_trigger, AlarmScheduler, EmergencyAction},
};

/// Handles "place emergency call now" and "cancel scheduled countdown"
pub struct EmergencyActionReceiver {
    caller: Arc<EmergencyCaller>,
    scheduler: Arc<dyn AlarmScheduler>,
    service: Arc<dyn BackgroundUnit>,
}

impl EmergencyActionReceiver {
    pub fn new(
        caller: Arc<EmergencyCaller>,
        scheduler: Arc<dyn AlarmScheduler>,
        service: Arc<dyn BackgroundUnit>,
    ) -> Self {
        Self { caller, scheduler, service }
    }

    /// Handle a raw action name. Unknown names are logged and ignored.
    pub fn on_receive(&self, action_name: &str) -> Option<EmergencyAction> {
        match EmergencyAction::from_action_name(action_name) {
            Some(action) => {
                self.handle(action);
                Some(action)
            }
            None => {
                warn!("Unknown action received, skipping: {}", action_name);
                None
            }
        }
    }

    /// Handle a parsed action. Placing a call always ends with the cancel step.
    pub fn handle(&self, action: EmergencyAction) -> Option<CallOutcome> {
        match action {
            EmergencyAction::PlaceCall => {
                info!("Starting to call emergency number");
                let outcome = self.caller.place_emergency_call();
                self.cancel_scheduled();
                Some(outcome)
            }
            EmergencyAction::CancelCountdown => {
                self.cancel_scheduled();
                None
            }
        }
    }

    fn cancel_scheduled(&self) {
        info!("Cancelling scheduled emergency calls and background countdown");
        self.scheduler.cancel(&new_call_emergency_trigger());
        self.service.stop();
    }
}
