//! Emergency Gesture - countdown, warning sound and emergency call daemon
//!
//! This library provides the emergency countdown state machine, the alarm
//! warning sound, the background continuation path that places or cancels
//! the emergency call, and the persistent emergency number override store.

pub mod api;
pub mod broadcast;
pub mod config;
pub mod countdown;
pub mod emergency_number;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use countdown::{CountdownController, CountdownOptions};
pub use emergency_number::EmergencyNumberProvider;
pub use state::{AppState, Platform};
pub use utils::signals::shutdown_signal;
