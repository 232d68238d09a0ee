//! Replaceable trigger handles and the scheduler that fires them

use std::{
    collections::HashMap,
    sync::Mutex,
    time::Duration,
};
use serde::{Deserialize, Serialize};
use tokio::{sync::mpsc, task::JoinHandle, time::sleep};
use tracing::{debug, info, warn};

const ACTION_START_EMERGENCY_CALL: &str = "emergency.gesture.action.MAKE_EMERGENCY_CALL";
const ACTION_CANCEL_COUNTDOWN: &str = "emergency.gesture.action.CANCEL_EMERGENCY_COUNTDOWN";

/// Signals understood by the background receiver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyAction {
    PlaceCall,
    CancelCountdown,
}

impl EmergencyAction {
    /// Wire name of the action
    pub fn action_name(&self) -> &'static str {
        match self {
            Self::PlaceCall => ACTION_START_EMERGENCY_CALL,
            Self::CancelCountdown => ACTION_CANCEL_COUNTDOWN,
        }
    }

    /// Parse a wire name, also accepting the short forms `call` and `cancel`
    pub fn from_action_name(name: &str) -> Option<Self> {
        match name {
            ACTION_START_EMERGENCY_CALL | "call" => Some(Self::PlaceCall),
            ACTION_CANCEL_COUNTDOWN | "cancel" => Some(Self::CancelCountdown),
            _ => None,
        }
    }
}

/// Opaque handle identifying one schedulable signal.
///
/// Handles for the same action compare equal, so scheduling a fresh handle
/// replaces whatever the previous one had pending.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TriggerHandle {
    action: EmergencyAction,
    request_code: u32,
}

impl TriggerHandle {
    pub fn action(&self) -> EmergencyAction {
        self.action
    }
}

/// Handle for "place emergency call now"
pub fn new_call_emergency_trigger() -> TriggerHandle {
    TriggerHandle {
        action: EmergencyAction::PlaceCall,
        request_code: 0,
    }
}

/// Handle for "cancel scheduled countdown"
pub fn new_cancel_countdown_trigger() -> TriggerHandle {
    TriggerHandle {
        action: EmergencyAction::CancelCountdown,
        request_code: 0,
    }
}

/// Fires trigger handles now or after a delay
pub trait AlarmScheduler: Send + Sync {
    /// Fire `trigger` after `delay`, replacing any pending schedule for it
    fn schedule(&self, trigger: &TriggerHandle, delay: Duration);
    /// Drop any pending schedule for `trigger`
    fn cancel(&self, trigger: &TriggerHandle);
    /// Fire `trigger` immediately
    fn send(&self, trigger: &TriggerHandle);
}

/// Scheduler backed by tokio timers, delivering fired actions to a dispatch channel
#[derive(Debug)]
pub struct TokioAlarmScheduler {
    dispatch: mpsc::UnboundedSender<EmergencyAction>,
    pending: Mutex<HashMap<TriggerHandle, JoinHandle<()>>>,
}

impl TokioAlarmScheduler {
    pub fn new(dispatch: mpsc::UnboundedSender<EmergencyAction>) -> Self {
        Self {
            dispatch,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Whether `trigger` is scheduled and has not fired yet
    pub fn is_scheduled(&self, trigger: &TriggerHandle) -> bool {
        self.pending
            .lock()
            .map(|pending| pending.get(trigger).is_some_and(|task| !task.is_finished()))
            .unwrap_or(false)
    }
}

impl AlarmScheduler for TokioAlarmScheduler {
    fn schedule(&self, trigger: &TriggerHandle, delay: Duration) {
        let dispatch = self.dispatch.clone();
        let action = trigger.action();
        let task = tokio::spawn(async move {
            sleep(delay).await;
            debug!("Scheduled trigger fired: {}", action.action_name());
            if dispatch.send(action).is_err() {
                warn!("Dispatch channel closed, dropping {}", action.action_name());
            }
        });

        match self.pending.lock() {
            Ok(mut pending) => {
                if let Some(previous) = pending.insert(trigger.clone(), task) {
                    debug!("Replacing pending trigger {}", action.action_name());
                    previous.abort();
                }
            }
            Err(e) => warn!("Failed to record scheduled trigger: {}", e),
        }
        info!("Scheduled {} in {}ms", action.action_name(), delay.as_millis());
    }

    fn cancel(&self, trigger: &TriggerHandle) {
        match self.pending.lock() {
            Ok(mut pending) => {
                if let Some(task) = pending.remove(trigger) {
                    task.abort();
                    debug!("Cancelled trigger {}", trigger.action().action_name());
                }
            }
            Err(e) => warn!("Failed to cancel trigger: {}", e),
        }
    }

    fn send(&self, trigger: &TriggerHandle) {
        if self.dispatch.send(trigger.action()).is_err() {
            warn!("Dispatch channel closed, dropping {}", trigger.action().action_name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factories_produce_equal_handles_per_action() {
        assert_eq!(new_call_emergency_trigger(), new_call_emergency_trigger());
        assert_ne!(new_call_emergency_trigger(), new_cancel_countdown_trigger());
        assert_eq!(new_cancel_countdown_trigger().action(), EmergencyAction::CancelCountdown);
    }

    #[test]
    fn action_names_parse_back() {
        for action in [EmergencyAction::PlaceCall, EmergencyAction::CancelCountdown] {
            assert_eq!(EmergencyAction::from_action_name(action.action_name()), Some(action));
        }
        assert_eq!(EmergencyAction::from_action_name("call"), Some(EmergencyAction::PlaceCall));
        assert_eq!(EmergencyAction::from_action_name("reboot"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn scheduled_trigger_fires_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = TokioAlarmScheduler::new(tx);
        let trigger = new_call_emergency_trigger();

        scheduler.schedule(&trigger, Duration::from_secs(5));
        assert!(scheduler.is_scheduled(&trigger));

        assert_eq!(rx.recv().await, Some(EmergencyAction::PlaceCall));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_replaces_previous_trigger() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = TokioAlarmScheduler::new(tx);

        scheduler.schedule(&new_call_emergency_trigger(), Duration::from_secs(1));
        scheduler.schedule(&new_call_emergency_trigger(), Duration::from_secs(10));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(rx.try_recv().ok(), Some(EmergencyAction::PlaceCall));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_trigger_never_fires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = TokioAlarmScheduler::new(tx);
        let trigger = new_call_emergency_trigger();

        scheduler.schedule(&trigger, Duration::from_secs(1));
        scheduler.cancel(&trigger);
        scheduler.cancel(&trigger);
        assert!(!scheduler.is_scheduled(&trigger));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn send_dispatches_immediately() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = TokioAlarmScheduler::new(tx);
        scheduler.send(&new_cancel_countdown_trigger());
        assert_eq!(rx.recv().await, Some(EmergencyAction::CancelCountdown));
    }
}
