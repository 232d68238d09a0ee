//! Background continuation path
//!
//! A UI-less entry point: scheduled or on-demand signals that place the
//! emergency call and tear down the background countdown.

pub mod receiver;
pub mod service;
pub mod triggers;

pub use receiver::EmergencyActionReceiver;
pub use service::{BackgroundUnit, EmergencyActionService, ServiceStatus};
pub use triggers::{
    new_call_emergency_trigger, new_cancel_countdown_trigger, AlarmScheduler, EmergencyAction,
    TokioAlarmScheduler, TriggerHandle,
};
